//! Variant dispatch tables
//!
//! Every rasterizer family is instantiated once per combination of depth
//! test, depth write, blend and (for triangles) stipple. The tables below map
//! the current state to the matching instantiation, so the state is looked at
//! once per primitive and never inside a pixel loop.
//!
//! Within a family the entry is `variant_index(depth_test, depth_write)`:
//!
//! | index | depth test | depth write |
//! |-------|------------|-------------|
//! | 0     | off        | off         |
//! | 1     | off        | on          |
//! | 2     | on         | off         |
//! | 3     | on         | on          |
//!
//! The tables are associated constants, fixed at compile time.

use super::line::draw_line;
use super::shader::{Flat, Mapping, Perspective, Smooth};
use super::triangle::{fill_triangle, SpanShader};
use super::Shading;
use crate::graphics::PixelFormat;
use crate::point::ScreenPoint;
use crate::surface::Surface;

/// Specialized triangle filler
pub type FillFn<P> = fn(&mut Surface<P>, &ScreenPoint, &ScreenPoint, &ScreenPoint);

/// Specialized line rasterizer
pub type LineFn<P> = fn(&mut Surface<P>, &ScreenPoint, &ScreenPoint);

/// Index of a variant within a family
#[inline]
pub const fn variant_index(depth_test: bool, depth_write: bool) -> usize {
    ((depth_test as usize) << 1) | depth_write as usize
}

const fn triangle_variants<P, S, const BLEND: bool, const STIP: bool>() -> [FillFn<P>; 4]
where
    P: PixelFormat,
    S: SpanShader<P>,
{
    [
        fill_triangle::<P, S, false, false, BLEND, STIP>,
        fill_triangle::<P, S, false, true, BLEND, STIP>,
        fill_triangle::<P, S, true, false, BLEND, STIP>,
        fill_triangle::<P, S, true, true, BLEND, STIP>,
    ]
}

/// Triangle fillers for one stipple setting
pub struct TriangleDispatch<P: PixelFormat> {
    pub flat: [FillFn<P>; 4],
    pub flat_noblend: [FillFn<P>; 4],
    pub smooth: [FillFn<P>; 4],
    pub smooth_noblend: [FillFn<P>; 4],
    pub mapping: [FillFn<P>; 4],
    pub mapping_noblend: [FillFn<P>; 4],
    pub textured: [FillFn<P>; 4],
    pub textured_noblend: [FillFn<P>; 4],
}

impl<P: PixelFormat> TriangleDispatch<P> {
    /// Stipple off
    pub const PLAIN: Self = Self::build::<false>();

    /// Stipple on
    pub const STIPPLED: Self = Self::build::<true>();

    const fn build<const STIP: bool>() -> Self {
        Self {
            flat: triangle_variants::<P, Flat<P>, true, STIP>(),
            flat_noblend: triangle_variants::<P, Flat<P>, false, STIP>(),
            smooth: triangle_variants::<P, Smooth, true, STIP>(),
            smooth_noblend: triangle_variants::<P, Smooth, false, STIP>(),
            mapping: triangle_variants::<P, Mapping, true, STIP>(),
            mapping_noblend: triangle_variants::<P, Mapping, false, STIP>(),
            textured: triangle_variants::<P, Perspective, true, STIP>(),
            textured_noblend: triangle_variants::<P, Perspective, false, STIP>(),
        }
    }

    /// The four depth variants of one shading family
    pub fn family(&self, shading: Shading, blend: bool) -> &[FillFn<P>; 4] {
        match (shading, blend) {
            (Shading::Flat, true) => &self.flat,
            (Shading::Flat, false) => &self.flat_noblend,
            (Shading::Smooth, true) => &self.smooth,
            (Shading::Smooth, false) => &self.smooth_noblend,
            (Shading::Mapping, true) => &self.mapping,
            (Shading::Mapping, false) => &self.mapping_noblend,
            (Shading::Textured, true) => &self.textured,
            (Shading::Textured, false) => &self.textured_noblend,
        }
    }

    pub fn select(
        shading: Shading,
        blend: bool,
        stipple: bool,
        depth_test: bool,
        depth_write: bool,
    ) -> FillFn<P> {
        let index = variant_index(depth_test, depth_write);
        if stipple {
            Self::STIPPLED.family(shading, blend)[index]
        } else {
            Self::PLAIN.family(shading, blend)[index]
        }
    }
}

const fn line_variants<P, const RGB: bool, const BLEND: bool>() -> [LineFn<P>; 4]
where
    P: PixelFormat,
{
    [
        draw_line::<P, RGB, false, false, BLEND>,
        draw_line::<P, RGB, false, true, BLEND>,
        draw_line::<P, RGB, true, false, BLEND>,
        draw_line::<P, RGB, true, true, BLEND>,
    ]
}

/// Line rasterizers: single color or interpolated, with or without blending
pub struct LineDispatch<P: PixelFormat> {
    pub flat: [LineFn<P>; 4],
    pub flat_noblend: [LineFn<P>; 4],
    pub interp: [LineFn<P>; 4],
    pub interp_noblend: [LineFn<P>; 4],
}

impl<P: PixelFormat> LineDispatch<P> {
    pub const TABLE: Self = Self {
        flat: line_variants::<P, false, true>(),
        flat_noblend: line_variants::<P, false, false>(),
        interp: line_variants::<P, true, true>(),
        interp_noblend: line_variants::<P, true, false>(),
    };

    pub fn select(interpolate: bool, blend: bool, depth_test: bool, depth_write: bool) -> LineFn<P> {
        let family = match (interpolate, blend) {
            (false, true) => &Self::TABLE.flat,
            (false, false) => &Self::TABLE.flat_noblend,
            (true, true) => &Self::TABLE.interp,
            (true, false) => &Self::TABLE.interp_noblend,
        };
        family[variant_index(depth_test, depth_write)]
    }
}
