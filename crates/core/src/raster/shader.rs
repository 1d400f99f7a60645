//! Span shaders: the per-pixel color policies of the triangle families

use super::fragment::{put_pixel, FragmentContext};
use super::triangle::{AttrFlags, Gradients, Span, SpanShader};
use crate::graphics::PixelFormat;
use crate::point::{depth16, ScreenPoint};
use crate::texture::TexelSource;

/// Pixels between two perspective divisions
pub const NB_INTERP: usize = 8;

/// Single color taken from the provoking vertex
pub(crate) struct Flat<P: PixelFormat> {
    color: P::Word,
}

impl<P: PixelFormat> SpanShader<P> for Flat<P> {
    const FLAGS: AttrFlags = AttrFlags {
        rgb: false,
        st: false,
        stz: false,
    };

    fn prepare(provoking: &ScreenPoint, _: Option<&TexelSource<P>>) -> Option<Self> {
        Some(Self {
            color: P::from_rgb16(provoking.r, provoking.g, provoking.b),
        })
    }

    #[inline]
    fn draw_span<const DT: bool, const DW: bool, const BLEND: bool, const STIP: bool>(
        &self,
        ctx: &FragmentContext<'_, P>,
        span: Span<'_, P>,
        grad: &Gradients,
    ) {
        let Span {
            color,
            depth,
            x,
            y,
            start,
        } = span;
        let dzdx = grad.dx.z;
        let mut z = start.z;
        for (i, (px, pz)) in color.iter_mut().zip(depth.iter_mut()).enumerate() {
            put_pixel::<P, DT, DW, BLEND, STIP>(ctx, px, pz, depth16(z), x + i as i32, y, || {
                self.color
            });
            z = z.wrapping_add(dzdx);
        }
    }
}

/// Gouraud shading
pub(crate) struct Smooth;

impl<P: PixelFormat> SpanShader<P> for Smooth {
    const FLAGS: AttrFlags = AttrFlags {
        rgb: true,
        st: false,
        stz: false,
    };

    fn prepare(_: &ScreenPoint, _: Option<&TexelSource<P>>) -> Option<Self> {
        Some(Smooth)
    }

    #[inline]
    fn draw_span<const DT: bool, const DW: bool, const BLEND: bool, const STIP: bool>(
        &self,
        ctx: &FragmentContext<'_, P>,
        span: Span<'_, P>,
        grad: &Gradients,
    ) {
        let Span {
            color,
            depth,
            x,
            y,
            start,
        } = span;
        let d = &grad.dx;
        let (mut z, mut r, mut g, mut b) = (start.z, start.r, start.g, start.b);
        for (i, (px, pz)) in color.iter_mut().zip(depth.iter_mut()).enumerate() {
            put_pixel::<P, DT, DW, BLEND, STIP>(ctx, px, pz, depth16(z), x + i as i32, y, || {
                P::from_rgb16(r, g, b)
            });
            z = z.wrapping_add(d.z);
            r = r.wrapping_add(d.r);
            g = g.wrapping_add(d.g);
            b = b.wrapping_add(d.b);
        }
    }
}

/// Affine texture mapping, unlit
///
/// s and t are stepped linearly in screen space, which is only correct for
/// triangles parallel to the screen.
pub(crate) struct Mapping;

impl<P: PixelFormat> SpanShader<P> for Mapping {
    const FLAGS: AttrFlags = AttrFlags {
        rgb: false,
        st: true,
        stz: false,
    };

    fn prepare(_: &ScreenPoint, texture: Option<&TexelSource<P>>) -> Option<Self> {
        texture.map(|_| Mapping)
    }

    #[inline]
    fn draw_span<const DT: bool, const DW: bool, const BLEND: bool, const STIP: bool>(
        &self,
        ctx: &FragmentContext<'_, P>,
        span: Span<'_, P>,
        grad: &Gradients,
    ) {
        let Some(tex) = ctx.texture else {
            return;
        };
        let Span {
            color,
            depth,
            x,
            y,
            start,
        } = span;
        let d = &grad.dx;
        let (mut z, mut s, mut t) = (start.z, start.s, start.t);
        for (i, (px, pz)) in color.iter_mut().zip(depth.iter_mut()).enumerate() {
            put_pixel::<P, DT, DW, BLEND, STIP>(ctx, px, pz, depth16(z), x + i as i32, y, || {
                tex.sample(s, t)
            });
            z = z.wrapping_add(d.z);
            s = s.wrapping_add(d.s);
            t = t.wrapping_add(d.t);
        }
    }
}

/// Perspective-correct, lit texture mapping
///
/// `s * z`, `t * z` and `z` are linear in screen space. Every [`NB_INTERP`]
/// pixels the true (s, t) is recovered by multiplying with `1 / z`; in
/// between, s and t step linearly. The reciprocal at the end of each batch is
/// refined from the previous one with two Newton-Raphson steps instead of a
/// division. The last partial batch extrapolates from the analytic derivative.
pub(crate) struct Perspective;

impl Perspective {
    /// `1 / z` from the previous batch's reciprocal, two Newton-Raphson steps
    ///
    /// Each step squares the relative error `e = 1 - z * zinv`. Newton only
    /// converges for `|e| < 1`, i.e. while `z` less than doubles over a batch;
    /// beyond that the reciprocal is divided out.
    #[inline(always)]
    fn refine(zinv: f32, z: f32) -> f32 {
        let e = 1.0 - z * zinv;
        if e.abs() >= 1.0 {
            return 1.0 / z;
        }
        // x' = x * (2 - z * x)
        let zinv = zinv + zinv * e;
        zinv * (2.0 - z * zinv)
    }
}

impl<P: PixelFormat> SpanShader<P> for Perspective {
    const FLAGS: AttrFlags = AttrFlags {
        rgb: true,
        st: false,
        stz: true,
    };

    fn prepare(_: &ScreenPoint, texture: Option<&TexelSource<P>>) -> Option<Self> {
        texture.map(|_| Perspective)
    }

    #[inline]
    fn draw_span<const DT: bool, const DW: bool, const BLEND: bool, const STIP: bool>(
        &self,
        ctx: &FragmentContext<'_, P>,
        span: Span<'_, P>,
        grad: &Gradients,
    ) {
        let Some(tex) = ctx.texture else {
            return;
        };
        let Span {
            color,
            depth,
            x,
            y,
            start,
        } = span;
        let d = &grad.dx;
        let (mut z, mut r, mut g, mut b) = (start.z, start.r, start.g, start.b);
        let (mut sz, mut tz) = (start.sz, start.tz);
        let fdzdx = d.z as f32;
        let mut fz = start.z as f32;
        let mut zinv = 1.0 / fz;
        let mut xi = x;

        let batch = NB_INTERP as f32;
        let full = color.len() / NB_INTERP * NB_INTERP;
        let (head_color, tail_color) = color.split_at_mut(full);
        let (head_depth, tail_depth) = depth.split_at_mut(full);

        for (pixels, depths) in head_color
            .chunks_exact_mut(NB_INTERP)
            .zip(head_depth.chunks_exact_mut(NB_INTERP))
        {
            let s0 = sz * zinv;
            let t0 = tz * zinv;
            fz += fdzdx * batch;
            zinv = Self::refine(zinv, fz);
            sz += d.sz * batch;
            tz += d.tz * batch;
            let dsdx = ((sz * zinv - s0) / batch) as i32;
            let dtdx = ((tz * zinv - t0) / batch) as i32;
            let (mut s, mut t) = (s0 as i32, t0 as i32);

            for (px, pz) in pixels.iter_mut().zip(depths.iter_mut()) {
                put_pixel::<P, DT, DW, BLEND, STIP>(ctx, px, pz, depth16(z), xi, y, || {
                    P::modulate(tex.sample(s, t), r, g, b)
                });
                z = z.wrapping_add(d.z);
                s = s.wrapping_add(dsdx);
                t = t.wrapping_add(dtdx);
                r = r.wrapping_add(d.r);
                g = g.wrapping_add(d.g);
                b = b.wrapping_add(d.b);
                xi += 1;
            }
        }

        if tail_color.is_empty() {
            return;
        }
        // d(sz / z)/dx = (dsz/dx - s * dz/dx) / z
        let ss = sz * zinv;
        let tt = tz * zinv;
        let dsdx = ((d.sz - ss * fdzdx) * zinv) as i32;
        let dtdx = ((d.tz - tt * fdzdx) * zinv) as i32;
        let (mut s, mut t) = (ss as i32, tt as i32);
        for (px, pz) in tail_color.iter_mut().zip(tail_depth.iter_mut()) {
            put_pixel::<P, DT, DW, BLEND, STIP>(ctx, px, pz, depth16(z), xi, y, || {
                P::modulate(tex.sample(s, t), r, g, b)
            });
            z = z.wrapping_add(d.z);
            s = s.wrapping_add(dsdx);
            t = t.wrapping_add(dtdx);
            r = r.wrapping_add(d.r);
            g = g.wrapping_add(d.g);
            b = b.wrapping_add(d.b);
            xi += 1;
        }
    }
}
