//! Framebuffer blending
//!
//! Blending combines an incoming fragment color (source) with the pixel
//! already in the color buffer (destination):
//!
//! `result = equation(src * src_factor, dst * dst_factor)`
//!
//! All arithmetic is 8-bit per channel and saturating. Only the color factors
//! are supported; the surface has no alpha channel.

use super::color::PixelFormat;
use serde::{Deserialize, Serialize};

/// Weight applied to one side of the blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
}

/// How the weighted source and destination are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendEquation {
    /// `src + dst`
    Add,
    /// `src - dst`
    Subtract,
    /// `dst - src`
    ReverseSubtract,
}

/// Blend configuration read at the start of each draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendState {
    pub enabled: bool,
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub equation: BlendEquation,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
            equation: BlendEquation::Add,
        }
    }
}

impl BlendState {
    /// Enabled additive blend (`src + dst`)
    pub fn additive() -> Self {
        Self {
            enabled: true,
            src: BlendFactor::One,
            dst: BlendFactor::One,
            equation: BlendEquation::Add,
        }
    }

    /// Blend a source pixel over a destination pixel
    ///
    /// Called regardless of `enabled`; the rasterizer only reaches this through
    /// its blending variants.
    #[inline]
    pub fn apply<P: PixelFormat>(&self, src: P::Word, dst: P::Word) -> P::Word {
        let (sr, sg, sb) = P::to_rgb8(src);
        let (dr, dg, db) = P::to_rgb8(dst);
        P::from_rgb8(
            self.channel(sr, dr),
            self.channel(sg, dg),
            self.channel(sb, db),
        )
    }

    #[inline(always)]
    fn channel(&self, s: u8, d: u8) -> u8 {
        let sw = weigh(s, factor(self.src, s, d));
        let dw = weigh(d, factor(self.dst, s, d));
        let out = match self.equation {
            BlendEquation::Add => sw + dw,
            BlendEquation::Subtract => sw.saturating_sub(dw),
            BlendEquation::ReverseSubtract => dw.saturating_sub(sw),
        };
        out.min(255) as u8
    }
}

#[inline(always)]
fn factor(f: BlendFactor, s: u8, d: u8) -> u32 {
    match f {
        BlendFactor::Zero => 0,
        BlendFactor::One => 255,
        BlendFactor::SrcColor => s as u32,
        BlendFactor::OneMinusSrcColor => 255 - s as u32,
        BlendFactor::DstColor => d as u32,
        BlendFactor::OneMinusDstColor => 255 - d as u32,
    }
}

#[inline(always)]
fn weigh(c: u8, f: u32) -> u32 {
    // Rounded c * f / 255
    let x = c as u32 * f + 128;
    (x + (x >> 8)) >> 8
}
