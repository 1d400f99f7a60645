//! Line rasterization
//!
//! Bresenham walk along the major axis. Each step moves either straight
//! along the major axis or diagonally; `n + 1` pixels are drawn for a major
//! axis length of `n`. z (and r/g/b for interpolated lines) advance by a
//! constant per step, colors with 8 extra fractional bits.

use super::fragment::{put_pixel, vertex_depth_range, FragmentContext};
use crate::graphics::{PixelFormat, StipplePattern};
use crate::point::{depth16, ScreenPoint};
use crate::surface::{RasterTarget, Surface};

/// Endpoints ordered top to bottom, then left to right
#[inline]
pub(crate) fn ordered<'a>(p1: &'a ScreenPoint, p2: &'a ScreenPoint) -> (&'a ScreenPoint, &'a ScreenPoint) {
    if p1.y > p2.y || (p1.y == p2.y && p1.x > p2.x) {
        (p2, p1)
    } else {
        (p1, p2)
    }
}

/// Draw one line, endpoints must lie inside the surface
///
/// With `RGB` false the whole line takes the color of the first endpoint
/// after ordering.
pub(crate) fn draw_line<P, const RGB: bool, const DT: bool, const DW: bool, const BLEND: bool>(
    surface: &mut Surface<P>,
    p1: &ScreenPoint,
    p2: &ScreenPoint,
) where
    P: PixelFormat,
{
    let (p1, p2) = ordered(p1, p2);

    let RasterTarget {
        width,
        height,
        stride,
        color,
        depth,
        state,
        ..
    } = surface.target();
    debug_assert!(
        [p1, p2]
            .iter()
            .all(|p| p.x >= 0 && p.y >= 0 && (p.x as usize) < width && (p.y as usize) < height),
        "line endpoints must be clipped to the {}x{} surface",
        width,
        height
    );
    let ctx = FragmentContext::<P> {
        blend: state.blend,
        stipple: &StipplePattern::SOLID,
        texture: None,
        depth_range: vertex_depth_range(&[p1, p2]),
    };
    let flat = P::from_rgb16(p1.r, p1.g, p1.b);

    let mut plot = |x: i32, y: i32, z: i32, r: i32, g: i32, b: i32| {
        let (xu, yu) = (x as usize, y as usize);
        put_pixel::<P, DT, DW, BLEND, false>(
            &ctx,
            &mut color[yu * stride + xu],
            &mut depth[yu * width + xu],
            depth16(z),
            x,
            y,
            || {
                if RGB {
                    P::from_rgb16(r >> 8, g >> 8, b >> 8)
                } else {
                    flat
                }
            },
        );
    };

    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    if dx == 0 && dy == 0 {
        plot(p1.x, p1.y, p1.z, p1.r << 8, p1.g << 8, p1.b << 8);
        return;
    }

    let step_x = if dx < 0 { -1 } else { 1 };
    let (adx, ady) = (dx.abs(), dy);
    // (major length, minor length, straight step)
    let (n, minor, straight) = if adx >= ady {
        (adx, ady, (step_x, 0))
    } else {
        (ady, adx, (0, 1))
    };
    let diagonal = (step_x, 1);

    let zinc = (p2.z - p1.z) / n;
    let (rinc, ginc, binc) = if RGB {
        (
            ((p2.r - p1.r) << 8) / n,
            ((p2.g - p1.g) << 8) / n,
            ((p2.b - p1.b) << 8) / n,
        )
    } else {
        (0, 0, 0)
    };

    let (mut x, mut y, mut z) = (p1.x, p1.y, p1.z);
    let (mut r, mut g, mut b) = (p1.r << 8, p1.g << 8, p1.b << 8);
    let mut a = 2 * minor - n;
    let straight_gain = 2 * minor;
    let diagonal_cost = 2 * n - 2 * minor;

    for _ in 0..=n {
        plot(x, y, z, r, g, b);
        z = z.wrapping_add(zinc);
        if RGB {
            r += rinc;
            g += ginc;
            b += binc;
        }
        if a > 0 {
            x += diagonal.0;
            y += diagonal.1;
            a -= diagonal_cost;
        } else {
            x += straight.0;
            y += straight.1;
            a += straight_gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{PixelMode, Xrgb8888};

    fn surface() -> Surface<Xrgb8888> {
        let mut s = Surface::<Xrgb8888>::open(16, 16, PixelMode::Rgba32, None).unwrap();
        s.clear(Some(0), Some(0));
        s
    }

    fn lit(s: &Surface<Xrgb8888>) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..s.height() {
            for x in 0..s.width() {
                if s.pixel(x, y) != Some(0) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_ordering() {
        let a = ScreenPoint::new(5, 1, 0);
        let b = ScreenPoint::new(2, 1, 0);
        let c = ScreenPoint::new(0, 3, 0);
        assert_eq!(ordered(&a, &b), (&b, &a));
        assert_eq!(ordered(&c, &a), (&a, &c));
    }

    #[test]
    fn test_horizontal_and_vertical_lengths() {
        let mut s = surface();
        draw_line::<Xrgb8888, false, false, true, false>(
            &mut s,
            &ScreenPoint::new(2, 3, 0),
            &ScreenPoint::new(9, 3, 0),
        );
        assert_eq!(lit(&s).len(), 8);

        let mut s = surface();
        draw_line::<Xrgb8888, false, false, true, false>(
            &mut s,
            &ScreenPoint::new(4, 12, 0),
            &ScreenPoint::new(4, 2, 0),
        );
        assert_eq!(lit(&s), (2..=12).map(|y| (4, y)).collect::<Vec<_>>());
    }

    #[test]
    fn test_diagonal_and_single_pixel() {
        let mut s = surface();
        draw_line::<Xrgb8888, false, false, true, false>(
            &mut s,
            &ScreenPoint::new(7, 0, 0),
            &ScreenPoint::new(0, 7, 0),
        );
        assert_eq!(lit(&s), (0..8).map(|i| (7 - i, i)).collect::<Vec<_>>());

        let mut s = surface();
        draw_line::<Xrgb8888, false, false, true, false>(
            &mut s,
            &ScreenPoint::new(5, 5, 0),
            &ScreenPoint::new(5, 5, 0),
        );
        assert_eq!(lit(&s), vec![(5, 5)]);
    }

    #[test]
    fn test_shallow_line_is_connected() {
        let mut s = surface();
        draw_line::<Xrgb8888, false, false, true, false>(
            &mut s,
            &ScreenPoint::new(0, 0, 0),
            &ScreenPoint::new(11, 4, 0),
        );
        let pixels = lit(&s);
        assert_eq!(pixels.len(), 12);
        for pair in pixels.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1);
        }
        assert!(pixels.contains(&(0, 0)) && pixels.contains(&(11, 4)));
    }

    #[test]
    fn test_interpolated_color_and_depth() {
        let mut s = surface();
        let a = ScreenPoint::with_depth16(0, 0, 100).with_rgb8(0, 0, 0);
        let b = ScreenPoint::with_depth16(8, 0, 900).with_rgb8(255, 0, 0);
        draw_line::<Xrgb8888, true, false, true, false>(&mut s, &a, &b);
        assert_eq!(s.pixel(0, 0), Some(0));
        let mid = s.pixel(4, 0).unwrap() >> 16;
        assert!((120..=135).contains(&mid), "mid red {}", mid);
        assert!(s.pixel(8, 0).unwrap() >> 16 >= 0xF0);
        assert_eq!(s.depth_at(0, 0), Some(100));
        assert_eq!(s.depth_at(4, 0), Some(500));
    }
}
