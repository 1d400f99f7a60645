//! Screen-space vertex fed to the rasterizers

use crate::graphics::ColorOps;
use serde::{Deserialize, Serialize};

/// Fractional bits of [`ScreenPoint::z`]; the depth buffer stores `z >> Z_FRAC_BITS`
pub const Z_FRAC_BITS: u32 = 14;

/// Fractional bits of [`ScreenPoint::s`] and [`ScreenPoint::t`] (1.0 = `1 << 22`)
pub const TEXCOORD_BITS: u32 = 22;

/// Largest `z` that still maps to a 16-bit depth value
pub const Z_MAX: i32 = (0xFFFF << Z_FRAC_BITS) | ((1 << Z_FRAC_BITS) - 1);

/// A transformed, clipped vertex in pixel coordinates
///
/// * `z` - depth with [`Z_FRAC_BITS`] fractional bits, larger is nearer
/// * `r`, `g`, `b` - color channels scaled to `0..=0xFFFF`
/// * `s`, `t` - texture coordinates with [`TEXCOORD_BITS`] fractional bits
///
/// Perspective texturing interpolates `s * z` and `t * z`, so `z` should be
/// proportional to `1 / w` for those triangles and must be positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub s: i32,
    pub t: i32,
}

impl ScreenPoint {
    /// White point at (x, y) with fixed-point depth `z`
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            x,
            y,
            z,
            r: 0xFFFF,
            g: 0xFFFF,
            b: 0xFFFF,
            s: 0,
            t: 0,
        }
    }

    /// Point whose stored depth will be exactly `depth`
    pub fn with_depth16(x: i32, y: i32, depth: u16) -> Self {
        Self::new(x, y, (depth as i32) << Z_FRAC_BITS)
    }

    /// Set color from an ARGB8888 word (alpha ignored)
    pub fn with_color(mut self, argb: u32) -> Self {
        (self.r, self.g, self.b) = ColorOps::to_rgb16(argb);
        self
    }

    pub fn with_rgb8(self, r: u8, g: u8, b: u8) -> Self {
        self.with_color(ColorOps::from_rgb(r, g, b))
    }

    /// Set texture coordinates from normalized floats (1.0 wraps to 0.0)
    pub fn with_texcoord(mut self, s: f32, t: f32) -> Self {
        let one = (1u32 << TEXCOORD_BITS) as f32;
        self.s = (s * one) as i32;
        self.t = (t * one) as i32;
        self
    }

    /// The 16-bit value this point writes into the depth buffer
    #[inline(always)]
    pub fn depth16(&self) -> u16 {
        depth16(self.z)
    }
}

/// Fixed-point depth to stored depth, saturating at both ends
///
/// Interpolated depth can step a little past a vertex at 0 or [`Z_MAX`]; it
/// must not wrap around to the opposite end of the range.
#[inline(always)]
pub(crate) fn depth16(z: i32) -> u16 {
    (z.clamp(0, Z_MAX) >> Z_FRAC_BITS) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_conversion() {
        let p = ScreenPoint::with_depth16(1, 2, 0x1234);
        assert_eq!(p.depth16(), 0x1234);
        assert_eq!(ScreenPoint::new(0, 0, Z_MAX).depth16(), 0xFFFF);
        // Fractional bits are truncated
        assert_eq!(ScreenPoint::new(0, 0, (5 << Z_FRAC_BITS) + 100).depth16(), 5);
    }

    #[test]
    fn test_depth_saturates() {
        assert_eq!(depth16(-1), 0);
        assert_eq!(depth16(-(1 << Z_FRAC_BITS) * 3), 0);
        assert_eq!(depth16(i32::MIN), 0);
        assert_eq!(depth16(Z_MAX + 1), 0xFFFF);
        assert_eq!(depth16(i32::MAX), 0xFFFF);
    }

    #[test]
    fn test_color_builders() {
        let p = ScreenPoint::new(0, 0, 0).with_rgb8(255, 128, 0);
        assert_eq!((p.r, p.g, p.b), (0xFFFF, 128 * 257, 0));
        let q = ScreenPoint::new(0, 0, 0).with_color(0x80FF8000);
        assert_eq!((q.r, q.g, q.b), (p.r, p.g, p.b));
    }

    #[test]
    fn test_texcoord_builder() {
        let p = ScreenPoint::new(0, 0, 0).with_texcoord(0.5, 0.25);
        assert_eq!(p.s, 1 << 21);
        assert_eq!(p.t, 1 << 20);
    }
}
