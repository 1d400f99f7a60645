//! Per-fragment depth/stipple/blend write shared by every rasterizer

use crate::graphics::{BlendState, PixelFormat, StipplePattern};
use crate::point::ScreenPoint;
use crate::texture::TexelSource;

/// State a span loop needs besides the pixels themselves
pub(crate) struct FragmentContext<'a, P: PixelFormat> {
    pub blend: BlendState,
    /// `StipplePattern::SOLID` when stippling is off
    pub stipple: &'a StipplePattern,
    pub texture: Option<&'a TexelSource<P>>,
    /// Smallest and largest vertex depth of the primitive
    pub depth_range: (u16, u16),
}

/// Stored-depth bounds spanned by a primitive's vertices
pub(crate) fn vertex_depth_range(points: &[&ScreenPoint]) -> (u16, u16) {
    points.iter().fold((u16::MAX, 0), |(lo, hi), p| {
        let z = p.depth16();
        (lo.min(z), hi.max(z))
    })
}

/// Write one fragment
///
/// Every flag is a const parameter, so each instantiation contains only the
/// tests it needs and the pixel loops calling it stay branch-free on state.
/// `shade` runs only for fragments that survive the depth and stipple tests.
/// Incoming depth is clamped to the primitive's vertex range: edge pixels
/// sample the plane up to one pixel outside the true edge, which on thin
/// triangles lands far beyond every vertex.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
pub(crate) fn put_pixel<P, const DT: bool, const DW: bool, const BLEND: bool, const STIP: bool>(
    ctx: &FragmentContext<'_, P>,
    px: &mut P::Word,
    pz: &mut u16,
    zz: u16,
    x: i32,
    y: i32,
    shade: impl FnOnce() -> P::Word,
) where
    P: PixelFormat,
{
    let zz = zz.clamp(ctx.depth_range.0, ctx.depth_range.1);
    if DT && zz < *pz {
        return;
    }
    if STIP && !ctx.stipple.covers(x, y) {
        return;
    }
    let color = shade();
    *px = if BLEND {
        ctx.blend.apply::<P>(color, *px)
    } else {
        color
    };
    if DW {
        *pz = zz;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Xrgb8888;

    fn ctx(stipple: &StipplePattern) -> FragmentContext<'_, Xrgb8888> {
        FragmentContext {
            blend: BlendState::additive(),
            stipple,
            texture: None,
            depth_range: (0, u16::MAX),
        }
    }

    #[test]
    fn test_depth_flags() {
        let solid = StipplePattern::SOLID;
        let ctx = ctx(&solid);
        let (mut px, mut pz) = (0u32, 100u16);

        // Farther fragment rejected only when testing
        put_pixel::<Xrgb8888, true, true, false, false>(&ctx, &mut px, &mut pz, 50, 0, 0, || 7);
        assert_eq!((px, pz), (0, 100));
        put_pixel::<Xrgb8888, false, true, false, false>(&ctx, &mut px, &mut pz, 50, 0, 0, || 7);
        assert_eq!((px, pz), (7, 50));

        // No depth write keeps the stored depth
        put_pixel::<Xrgb8888, true, false, false, false>(&ctx, &mut px, &mut pz, 60, 0, 0, || 9);
        assert_eq!((px, pz), (9, 50));
    }

    #[test]
    fn test_depth_clamped_to_vertex_range() {
        let solid = StipplePattern::SOLID;
        let a = ScreenPoint::with_depth16(0, 0, 200);
        let b = ScreenPoint::with_depth16(5, 5, 900);
        let ctx = FragmentContext {
            depth_range: vertex_depth_range(&[&a, &b]),
            ..ctx(&solid)
        };
        assert_eq!(ctx.depth_range, (200, 900));

        let (mut px, mut pz) = (0u32, 0u16);
        put_pixel::<Xrgb8888, false, true, false, false>(&ctx, &mut px, &mut pz, 0xFFFF, 0, 0, || 1);
        assert_eq!(pz, 900);
        put_pixel::<Xrgb8888, false, true, false, false>(&ctx, &mut px, &mut pz, 3, 0, 0, || 1);
        assert_eq!(pz, 200);

        // A clamped fragment still loses to nearer stored depth
        pz = 950;
        put_pixel::<Xrgb8888, true, true, false, false>(&ctx, &mut px, &mut pz, 0xFFFF, 0, 0, || 2);
        assert_eq!((px, pz), (1, 950));
    }

    #[test]
    fn test_stipple_and_blend() {
        let pattern = StipplePattern::checkerboard(1);
        let ctx = ctx(&pattern);
        let (mut px, mut pz) = (0x0000_0010u32, 0u16);

        // (1, 0) is a hole in the checkerboard
        put_pixel::<Xrgb8888, false, false, true, true>(&ctx, &mut px, &mut pz, 0, 1, 0, || {
            panic!("shaded a stippled-out fragment")
        });
        assert_eq!(px, 0x10);

        put_pixel::<Xrgb8888, false, false, true, true>(&ctx, &mut px, &mut pz, 0, 0, 0, || 0x20);
        assert_eq!(px, 0x30);
    }
}
