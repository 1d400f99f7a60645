//! Point rasterization

use crate::dirty::DirtyRect;
use crate::graphics::PixelFormat;
use crate::point::ScreenPoint;
use crate::surface::{RasterTarget, Surface};

/// Square footprint of a point of side `size` around (x, y), clipped
pub(crate) fn footprint(p: &ScreenPoint, size: u32, width: u32, height: u32) -> Option<DirtyRect> {
    let size = size.max(1) as i32;
    let x0 = p.x - (size - 1) / 2;
    let y0 = p.y - (size - 1) / 2;
    DirtyRect::clipped(x0, y0, x0 + size - 1, y0 + size - 1, width, height)
}

/// Draw one point
///
/// Points are rare enough that the state is checked per texel instead of
/// going through a dispatch table.
pub(crate) fn plot_point<P: PixelFormat>(surface: &mut Surface<P>, p: &ScreenPoint) {
    let Some(rect) = footprint(p, surface.state().point_size, surface.width(), surface.height())
    else {
        return;
    };

    let RasterTarget {
        width,
        stride,
        color,
        depth,
        state,
        ..
    } = surface.target();
    let zz = p.depth16();
    let word = P::from_rgb16(p.r, p.g, p.b);
    let blend = state.blend.enabled.then_some(state.blend);

    for y in rect.y_min as usize..=rect.y_max as usize {
        for x in rect.x_min as usize..=rect.x_max as usize {
            let pz = &mut depth[y * width + x];
            if state.depth_test && zz < *pz {
                continue;
            }
            let px = &mut color[y * stride + x];
            *px = match &blend {
                Some(b) => b.apply::<P>(word, *px),
                None => word,
            };
            if state.depth_write {
                *pz = zz;
            }
        }
    }

    surface.mark_dirty(rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_centering() {
        let p = ScreenPoint::new(10, 10, 0);
        let one = footprint(&p, 1, 64, 64).unwrap();
        assert_eq!((one.x_min, one.x_max, one.y_min, one.y_max), (10, 10, 10, 10));

        // Even sizes extend one more texel right and down
        let two = footprint(&p, 2, 64, 64).unwrap();
        assert_eq!((two.x_min, two.x_max), (10, 11));
        let three = footprint(&p, 3, 64, 64).unwrap();
        assert_eq!((three.x_min, three.x_max), (9, 11));

        // Size 0 draws like size 1
        assert_eq!(footprint(&p, 0, 64, 64), Some(one));
    }

    #[test]
    fn test_footprint_clipping() {
        let corner = footprint(&ScreenPoint::new(0, 0, 0), 5, 64, 64).unwrap();
        assert_eq!((corner.x_min, corner.y_min, corner.x_max, corner.y_max), (0, 0, 2, 2));
        assert!(footprint(&ScreenPoint::new(-10, 3, 0), 3, 64, 64).is_none());
    }
}
