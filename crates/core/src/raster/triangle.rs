//! Triangle scan conversion
//!
//! Setup sorts the vertices by `y`, computes the per-x and per-y gradients
//! of every interpolated attribute from the plane through the three
//! vertices, then walks two parts: top vertex to middle vertex and middle
//! vertex to bottom vertex. The long edge (top to bottom) stays on one side
//! for the whole triangle.
//!
//! The left edge carries the attributes and advances with a 16.16 error term
//! so its x is always an integer; the right edge only tracks x. Each scanline
//! hands the span `[x_left, x_right]` to a [`SpanShader`].
//!
//! Vertices with equal `y` keep their submission order (the sort is stable),
//! which fixes which edge is "long" for flat-top and flat-bottom triangles.

use super::fragment::{vertex_depth_range, FragmentContext};
use crate::graphics::{PixelFormat, StipplePattern};
use crate::logging::{log, LogCategory, LogLevel};
use crate::point::ScreenPoint;
use crate::surface::{RasterTarget, Surface};
use crate::texture::TexelSource;

/// Interpolated vertex attributes
///
/// `sz` and `tz` are `s * z` and `t * z`; they are only filled in for
/// perspective texturing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Attrs {
    pub z: i32,
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub s: i32,
    pub t: i32,
    pub sz: f32,
    pub tz: f32,
}

impl Attrs {
    fn at(p: &ScreenPoint, stz: bool) -> Self {
        let (sz, tz) = if stz {
            (p.s as f32 * p.z as f32, p.t as f32 * p.z as f32)
        } else {
            (0.0, 0.0)
        };
        Self {
            z: p.z,
            r: p.r,
            g: p.g,
            b: p.b,
            s: p.s,
            t: p.t,
            sz,
            tz,
        }
    }

    #[inline(always)]
    fn add(&self, o: &Attrs) -> Attrs {
        Attrs {
            z: self.z.wrapping_add(o.z),
            r: self.r.wrapping_add(o.r),
            g: self.g.wrapping_add(o.g),
            b: self.b.wrapping_add(o.b),
            s: self.s.wrapping_add(o.s),
            t: self.t.wrapping_add(o.t),
            sz: self.sz + o.sz,
            tz: self.tz + o.tz,
        }
    }

    fn scale(&self, k: i32) -> Attrs {
        Attrs {
            z: self.z.wrapping_mul(k),
            r: self.r.wrapping_mul(k),
            g: self.g.wrapping_mul(k),
            b: self.b.wrapping_mul(k),
            s: self.s.wrapping_mul(k),
            t: self.t.wrapping_mul(k),
            sz: self.sz * k as f32,
            tz: self.tz * k as f32,
        }
    }
}

/// Attribute change per pixel along x (`dx`) and per scanline along y (`dy`)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Gradients {
    pub dx: Attrs,
    pub dy: Attrs,
}

/// Triangle setup result
struct Setup {
    grad: Gradients,
    /// The middle vertex lies right of the long edge
    middle_on_right: bool,
}

impl Setup {
    /// `None` for zero-area triangles
    fn new(p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint, flags: AttrFlags) -> Option<Self> {
        let (dx1, dy1) = (p1.x - p0.x, p1.y - p0.y);
        let (dx2, dy2) = (p2.x - p0.x, p2.y - p0.y);
        let area = signed_area(p0, p1, p2);
        if area == 0 {
            return None;
        }

        let inv = 1.0 / area as f32;
        let (fdx1, fdy1) = (dx1 as f32 * inv, dy1 as f32 * inv);
        let (fdx2, fdy2) = (dx2 as f32 * inv, dy2 as f32 * inv);

        // Plane gradient of one attribute from its deltas along both edges
        let plane = |d1: f32, d2: f32| (fdy2 * d1 - fdy1 * d2, fdx1 * d2 - fdx2 * d1);
        let int_plane = |a0: i32, a1: i32, a2: i32| {
            let (ddx, ddy) = plane(a1.wrapping_sub(a0) as f32, a2.wrapping_sub(a0) as f32);
            (ddx as i32, ddy as i32)
        };

        let mut grad = Gradients::default();
        (grad.dx.z, grad.dy.z) = int_plane(p0.z, p1.z, p2.z);
        if flags.rgb {
            (grad.dx.r, grad.dy.r) = int_plane(p0.r, p1.r, p2.r);
            (grad.dx.g, grad.dy.g) = int_plane(p0.g, p1.g, p2.g);
            (grad.dx.b, grad.dy.b) = int_plane(p0.b, p1.b, p2.b);
        }
        if flags.st {
            (grad.dx.s, grad.dy.s) = int_plane(p0.s, p1.s, p2.s);
            (grad.dx.t, grad.dy.t) = int_plane(p0.t, p1.t, p2.t);
        }
        if flags.stz {
            let [a0, a1, a2] = [p0, p1, p2].map(|p| Attrs::at(p, true));
            (grad.dx.sz, grad.dy.sz) = plane(a1.sz - a0.sz, a2.sz - a0.sz);
            (grad.dx.tz, grad.dy.tz) = plane(a1.tz - a0.tz, a2.tz - a0.tz);
        }

        Some(Self {
            grad,
            middle_on_right: area > 0,
        })
    }
}

/// Twice the signed area of a screen-space triangle
#[inline]
pub(crate) fn signed_area(p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint) -> i64 {
    let (dx1, dy1) = ((p1.x - p0.x) as i64, (p1.y - p0.y) as i64);
    let (dx2, dy2) = ((p2.x - p0.x) as i64, (p2.y - p0.y) as i64);
    dx1 * dy2 - dx2 * dy1
}

/// Which attribute groups a shader interpolates
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AttrFlags {
    pub rgb: bool,
    pub st: bool,
    pub stz: bool,
}

/// 16.16 x step of an edge per scanline, 0 for horizontal edges
#[inline]
fn edge_slope(a: &ScreenPoint, b: &ScreenPoint) -> i32 {
    let dy = b.y - a.y;
    if dy > 0 {
        ((b.x - a.x) << 16) / dy
    } else {
        0
    }
}

/// Left edge walker
///
/// x advances by `dxdy_min` or `dxdy_min + 1` each line; the attributes move
/// by the matching `dmin`/`dmax` so they stay on the plane at integer x.
#[derive(Default)]
struct LeftEdge {
    x: i32,
    error: i32,
    derror: i32,
    dxdy_min: i32,
    dxdy_max: i32,
    attrs: Attrs,
    dmin: Attrs,
    dmax: Attrs,
}

impl LeftEdge {
    fn new(a: &ScreenPoint, b: &ScreenPoint, grad: &Gradients, stz: bool) -> Self {
        let slope = edge_slope(a, b);
        let dxdy_min = slope >> 16;
        let dmin = grad.dy.add(&grad.dx.scale(dxdy_min));
        Self {
            x: a.x,
            error: 0,
            derror: slope & 0xFFFF,
            dxdy_min,
            dxdy_max: dxdy_min + 1,
            attrs: Attrs::at(a, stz),
            dmin,
            dmax: dmin.add(&grad.dx),
        }
    }

    #[inline]
    fn step(&mut self) {
        self.error += self.derror;
        if self.error > 0 {
            self.error -= 0x10000;
            self.x += self.dxdy_max;
            self.attrs = self.attrs.add(&self.dmax);
        } else {
            self.x += self.dxdy_min;
            self.attrs = self.attrs.add(&self.dmin);
        }
    }
}

/// One scanline run handed to a shader
pub(crate) struct Span<'s, P: PixelFormat> {
    pub color: &'s mut [P::Word],
    pub depth: &'s mut [u16],
    /// Screen position of the first pixel
    pub x: i32,
    pub y: i32,
    /// Attributes at the first pixel
    pub start: Attrs,
}

/// Per-pixel color policy of a triangle family
pub(crate) trait SpanShader<P: PixelFormat>: Sized {
    const FLAGS: AttrFlags;

    /// Per-triangle setup; `provoking` is the last submitted vertex.
    /// `None` skips the triangle.
    fn prepare(provoking: &ScreenPoint, texture: Option<&TexelSource<P>>) -> Option<Self>;

    fn draw_span<const DT: bool, const DW: bool, const BLEND: bool, const STIP: bool>(
        &self,
        ctx: &FragmentContext<'_, P>,
        span: Span<'_, P>,
        grad: &Gradients,
    );
}

fn points_inside(points: [&ScreenPoint; 3], width: usize, height: usize) -> bool {
    points
        .iter()
        .all(|p| p.x >= 0 && p.y >= 0 && (p.x as usize) < width && (p.y as usize) < height)
}

/// Fill one triangle with shader `S`
///
/// Points must already be clipped to the surface.
pub(crate) fn fill_triangle<P, S, const DT: bool, const DW: bool, const BLEND: bool, const STIP: bool>(
    surface: &mut Surface<P>,
    p0: &ScreenPoint,
    p1: &ScreenPoint,
    p2: &ScreenPoint,
) where
    P: PixelFormat,
    S: SpanShader<P>,
{
    let provoking = p2;
    let mut sorted = [p0, p1, p2];
    sorted.sort_by_key(|p| p.y);
    let [p0, p1, p2] = sorted;

    let Some(setup) = Setup::new(p0, p1, p2, S::FLAGS) else {
        log(LogCategory::Raster, LogLevel::Trace, || {
            format!(
                "Skipped degenerate triangle ({},{}) ({},{}) ({},{})",
                p0.x, p0.y, p1.x, p1.y, p2.x, p2.y
            )
        });
        return;
    };

    let RasterTarget {
        width,
        height,
        stride,
        color,
        depth,
        state,
        texture,
    } = surface.target();
    debug_assert!(
        points_inside([p0, p1, p2], width, height),
        "triangle vertices must be clipped to the {}x{} surface",
        width,
        height
    );

    let Some(shader) = S::prepare(provoking, texture) else {
        log(LogCategory::Raster, LogLevel::Warn, || {
            "Textured triangle drawn without a bound texture".to_string()
        });
        return;
    };
    let ctx = FragmentContext {
        blend: state.blend,
        stipple: state.stipple.as_ref().unwrap_or(&StipplePattern::SOLID),
        texture,
        depth_range: vertex_depth_range(&[p0, p1, p2]),
    };

    let grad = &setup.grad;
    let mut left = LeftEdge::default();
    let mut x2 = 0i32;
    let mut dx2dy2 = 0i32;
    let mut y = p0.y;

    for part in 0..2 {
        let (new_left, new_right, lines) = match (part, setup.middle_on_right) {
            (0, true) => (Some((p0, p2)), Some((p0, p1)), p1.y - p0.y),
            (0, false) => (Some((p0, p1)), Some((p0, p2)), p1.y - p0.y),
            (_, true) => (None, Some((p1, p2)), p2.y - p1.y + 1),
            (_, false) => (Some((p1, p2)), None, p2.y - p1.y + 1),
        };
        if let Some((a, b)) = new_left {
            left = LeftEdge::new(a, b, grad, S::FLAGS.stz);
        }
        if let Some((a, b)) = new_right {
            dx2dy2 = edge_slope(a, b);
            x2 = a.x << 16;
        }

        for _ in 0..lines {
            let n = (x2 >> 16) - left.x;
            if n >= 0 {
                let (row, x1, len) = (y as usize, left.x as usize, n as usize + 1);
                let c0 = row * stride + x1;
                let d0 = row * width + x1;
                shader.draw_span::<DT, DW, BLEND, STIP>(
                    &ctx,
                    Span {
                        color: &mut color[c0..c0 + len],
                        depth: &mut depth[d0..d0 + len],
                        x: left.x,
                        y,
                        start: left.attrs,
                    },
                    grad,
                );
            }
            left.step();
            x2 = x2.wrapping_add(dx2dy2);
            y += 1;
        }
    }
}
