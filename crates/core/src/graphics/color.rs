//! Packed pixel formats and color conversion
//!
//! A surface stores one packed word per texel. The layout of that word is fixed
//! per surface by a [`PixelFormat`] type parameter, so every rasterizer loop is
//! compiled once per format and never branches on it.
//!
//! Colors enter the core either as ARGB8888 words (0xAARRGGBB, see [`ColorOps`])
//! or as 16-bit scaled channels carried on a [`ScreenPoint`](crate::ScreenPoint).

use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Pixel layouts a surface may be opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelMode {
    /// 16-bit 5:6:5
    Rgb565,
    /// 24-bit, bytes in R, G, B order
    Rgb24,
    /// 32-bit word 0x00RRGGBB
    Rgba32,
    /// 8-bit palette index (no rasterizer support)
    Indexed,
}

impl PixelMode {
    /// Bytes per packed pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelMode::Rgb565 => 2,
            PixelMode::Rgb24 => 3,
            PixelMode::Rgba32 => 4,
            PixelMode::Indexed => 1,
        }
    }
}

impl std::str::FromStr for PixelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rgb565" | "565" | "16" => Ok(PixelMode::Rgb565),
            "rgb24" | "24" => Ok(PixelMode::Rgb24),
            "rgba32" | "rgba" | "xrgb8888" | "32" => Ok(PixelMode::Rgba32),
            "indexed" | "index" | "8" => Ok(PixelMode::Indexed),
            _ => Err(format!("unknown pixel mode: {}", s)),
        }
    }
}

/// Compile-time description of a packed pixel layout
///
/// Channel conversions are expected to be cheap enough to run once per pixel
/// inside span loops; implementations should be `#[inline]`.
pub trait PixelFormat: Send + Sync + 'static {
    /// One packed pixel
    type Word: Pod + Default + PartialEq + Debug + Send + Sync;

    /// Mode tag used when opening surfaces
    const MODE: PixelMode;

    /// Size of [`Self::Word`] in bytes
    const BYTES: usize = std::mem::size_of::<Self::Word>();

    /// Short human readable name
    const NAME: &'static str;

    fn from_rgb8(r: u8, g: u8, b: u8) -> Self::Word;

    fn to_rgb8(word: Self::Word) -> (u8, u8, u8);

    /// Pack 16-bit scaled channels (`0..=0xFFFF`, out of range values clamp)
    #[inline]
    fn from_rgb16(r: i32, g: i32, b: i32) -> Self::Word {
        Self::from_rgb8(channel16_to_8(r), channel16_to_8(g), channel16_to_8(b))
    }

    /// Pack an ARGB8888 color, alpha is ignored
    #[inline]
    fn from_argb(argb: u32) -> Self::Word {
        Self::from_rgb8(
            ColorOps::red(argb),
            ColorOps::green(argb),
            ColorOps::blue(argb),
        )
    }

    /// Multiply a texel by a 16-bit scaled color (lit texturing)
    #[inline]
    fn modulate(texel: Self::Word, r: i32, g: i32, b: i32) -> Self::Word {
        let (tr, tg, tb) = Self::to_rgb8(texel);
        Self::from_rgb8(
            modulate_channel(tr, r),
            modulate_channel(tg, g),
            modulate_channel(tb, b),
        )
    }
}

#[inline(always)]
fn channel16_to_8(c: i32) -> u8 {
    (c.clamp(0, 0xFFFF) >> 8) as u8
}

/// `c * (scale + 1) >> 16`, exact for both full (0xFFFF) and zero scale
#[inline(always)]
pub(crate) fn modulate_channel(c: u8, scale16: i32) -> u8 {
    ((c as u32 * (scale16.clamp(0, 0xFFFF) as u32 + 1)) >> 16) as u8
}

/// 16-bit 5:6:5 pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb565;

impl PixelFormat for Rgb565 {
    type Word = u16;
    const MODE: PixelMode = PixelMode::Rgb565;
    const NAME: &'static str = "RGB565";

    #[inline]
    fn from_rgb8(r: u8, g: u8, b: u8) -> u16 {
        ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
    }

    #[inline]
    fn to_rgb8(word: u16) -> (u8, u8, u8) {
        let r = ((word >> 11) & 0x1F) as u8;
        let g = ((word >> 5) & 0x3F) as u8;
        let b = (word & 0x1F) as u8;
        // Replicate the high bits so full intensity maps back to 255
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }
}

/// 24-bit pixels stored as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb24;

impl PixelFormat for Rgb24 {
    type Word = [u8; 3];
    const MODE: PixelMode = PixelMode::Rgb24;
    const NAME: &'static str = "RGB24";

    #[inline]
    fn from_rgb8(r: u8, g: u8, b: u8) -> [u8; 3] {
        [r, g, b]
    }

    #[inline]
    fn to_rgb8(word: [u8; 3]) -> (u8, u8, u8) {
        (word[0], word[1], word[2])
    }
}

/// 32-bit pixels, 0x00RRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Xrgb8888;

impl PixelFormat for Xrgb8888 {
    type Word = u32;
    const MODE: PixelMode = PixelMode::Rgba32;
    const NAME: &'static str = "XRGB8888";

    #[inline]
    fn from_rgb8(r: u8, g: u8, b: u8) -> u32 {
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    #[inline]
    fn to_rgb8(word: u32) -> (u8, u8, u8) {
        ((word >> 16) as u8, (word >> 8) as u8, word as u8)
    }

    #[inline]
    fn from_rgb16(r: i32, g: i32, b: i32) -> u32 {
        let r = r.clamp(0, 0xFFFF) as u32;
        let g = g.clamp(0, 0xFFFF) as u32;
        let b = b.clamp(0, 0xFFFF) as u32;
        ((r << 8) & 0xFF_0000) | (g & 0xFF00) | (b >> 8)
    }

    #[inline]
    fn from_argb(argb: u32) -> u32 {
        argb & 0x00FF_FFFF
    }
}

/// ARGB8888 color helpers (0xAARRGGBB)
pub struct ColorOps;

impl ColorOps {
    /// Extract red channel from ARGB color
    #[inline]
    pub fn red(color: u32) -> u8 {
        ((color >> 16) & 0xFF) as u8
    }

    /// Extract green channel from ARGB color
    #[inline]
    pub fn green(color: u32) -> u8 {
        ((color >> 8) & 0xFF) as u8
    }

    /// Extract blue channel from ARGB color
    #[inline]
    pub fn blue(color: u32) -> u8 {
        (color & 0xFF) as u8
    }

    /// Construct RGB color with full alpha
    ///
    /// # Example
    ///
    /// ```
    /// use softraster_core::graphics::ColorOps;
    ///
    /// let green = ColorOps::from_rgb(0, 255, 0);
    /// assert_eq!(green, 0xFF00FF00);
    /// ```
    #[inline]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> u32 {
        0xFF000000 | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
    }

    /// Widen an 8-bit channel to the 16-bit scale used by screen points
    ///
    /// `c * 257` keeps the round trip through `>> 8` exact.
    #[inline]
    pub fn channel_to_16(c: u8) -> i32 {
        c as i32 * 257
    }

    /// Split an ARGB color into 16-bit scaled channels
    #[inline]
    pub fn to_rgb16(color: u32) -> (i32, i32, i32) {
        (
            Self::channel_to_16(Self::red(color)),
            Self::channel_to_16(Self::green(color)),
            Self::channel_to_16(Self::blue(color)),
        )
    }
}

/// Convert one packed pixel between formats
#[inline]
pub fn convert<S: PixelFormat, D: PixelFormat>(word: S::Word) -> D::Word {
    let (r, g, b) = S::to_rgb8(word);
    D::from_rgb8(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_packing() {
        assert_eq!(Rgb565::from_rgb8(255, 0, 0), 0xF800);
        assert_eq!(Rgb565::from_rgb8(0, 255, 0), 0x07E0);
        assert_eq!(Rgb565::from_rgb8(0, 0, 255), 0x001F);
        // Full intensity must survive the trip back to 8 bits
        assert_eq!(Rgb565::to_rgb8(0xFFFF), (255, 255, 255));
        assert_eq!(Rgb565::to_rgb8(0x0000), (0, 0, 0));
    }

    #[test]
    fn test_xrgb_from_rgb16_matches_fixed_point_layout() {
        // 16-bit channels keep their high byte
        assert_eq!(Xrgb8888::from_rgb16(0xFF00, 0x8000, 0x0100), 0x00FF_8001);
        // Out of range interpolation results clamp instead of bleeding into
        // neighbouring channels
        assert_eq!(Xrgb8888::from_rgb16(0x1_0400, -20, 0), 0x00FF_0000);
        assert_eq!(Rgb565::from_rgb16(0x1_0400, -20, 0), 0xF800);
    }

    #[test]
    fn test_rgb16_scale_round_trip() {
        for c in [0u8, 1, 127, 128, 254, 255] {
            let (r, g, b) = ColorOps::to_rgb16(ColorOps::from_rgb(c, c, c));
            assert_eq!(Xrgb8888::from_rgb16(r, g, b), Xrgb8888::from_rgb8(c, c, c));
            assert_eq!(Rgb24::from_rgb16(r, g, b), [c, c, c]);
        }
    }

    #[test]
    fn test_modulate() {
        let texel = Xrgb8888::from_rgb8(200, 100, 50);
        // White light leaves the texel unchanged
        assert_eq!(Xrgb8888::modulate(texel, 0xFFFF, 0xFFFF, 0xFFFF), texel);
        // No light gives black
        assert_eq!(Xrgb8888::modulate(texel, 0, 0, 0), 0);
        // Half light roughly halves each channel
        let (r, g, b) = Xrgb8888::to_rgb8(Xrgb8888::modulate(texel, 0x8000, 0x8000, 0x8000));
        assert_eq!((r, g, b), (100, 50, 25));
    }

    #[test]
    fn test_convert_between_formats() {
        let px = Xrgb8888::from_rgb8(255, 255, 0);
        assert_eq!(convert::<Xrgb8888, Rgb565>(px), 0xFFE0);
        assert_eq!(convert::<Rgb565, Rgb24>(0xFFE0), [255, 255, 0]);
        assert_eq!(convert::<Rgb24, Xrgb8888>([1, 2, 3]), 0x0001_0203);
    }

    #[test]
    fn test_pixel_mode_parsing() {
        assert_eq!("RGB565".parse::<PixelMode>(), Ok(PixelMode::Rgb565));
        assert_eq!("rgba32".parse::<PixelMode>(), Ok(PixelMode::Rgba32));
        assert_eq!("24".parse::<PixelMode>(), Ok(PixelMode::Rgb24));
        assert!("cmyk".parse::<PixelMode>().is_err());
        assert_eq!(PixelMode::Rgb24.bytes_per_pixel(), 3);
        assert_eq!(Rgb24::BYTES, 3);
        assert_eq!(Xrgb8888::BYTES, 4);
    }
}
