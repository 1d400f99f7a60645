//! Texel sources for texture-mapped triangles
//!
//! A [`TexelSource`] is a power-of-two image already converted to the pixel
//! format of the surface it is bound to. Texture coordinates are fixed point
//! with [`TEXCOORD_BITS`] fractional bits, so a texel address is two shifts
//! and two masks away:
//!
//! ```text
//! u = (s >> (22 - log2 width))  & (width - 1)
//! v = (t >> (22 - log2 height)) & (height - 1)
//! texel = pixels[v << log2 width | u]
//! ```
//!
//! Masking wraps out of range coordinates (repeat addressing).

use crate::graphics::PixelFormat;
use crate::point::TEXCOORD_BITS;
use crate::surface::Surface;
use crate::RasterError;

#[derive(Debug, Clone)]
pub struct TexelSource<P: PixelFormat> {
    width: u32,
    height: u32,
    width_log2: u32,
    /// Right shifts applied to (s, t)
    shift: [u32; 2],
    /// Masks applied after the shift
    mask: [u32; 2],
    pixels: Vec<P::Word>,
}

impl<P: PixelFormat> TexelSource<P> {
    /// Wrap already packed texels (row-major, no padding)
    pub fn new(width: u32, height: u32, pixels: Vec<P::Word>) -> Result<Self, RasterError> {
        let max = 1u32 << TEXCOORD_BITS;
        if !width.is_power_of_two() || !height.is_power_of_two() || width > max || height > max {
            return Err(RasterError::TextureNotPowerOfTwo { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RasterError::TextureSizeMismatch {
                width,
                height,
                len: pixels.len(),
                expected,
            });
        }
        let width_log2 = width.trailing_zeros();
        let height_log2 = height.trailing_zeros();
        Ok(Self {
            width,
            height,
            width_log2,
            shift: [TEXCOORD_BITS - width_log2, TEXCOORD_BITS - height_log2],
            mask: [width - 1, height - 1],
            pixels,
        })
    }

    /// Build from tightly packed RGB bytes
    pub fn from_rgb8(width: u32, height: u32, rgb: &[u8]) -> Result<Self, RasterError> {
        if rgb.len() % 3 != 0 {
            return Err(RasterError::TextureSizeMismatch {
                width,
                height,
                len: rgb.len() / 3,
                expected: width as usize * height as usize,
            });
        }
        let pixels = rgb
            .chunks_exact(3)
            .map(|c| P::from_rgb8(c[0], c[1], c[2]))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Build by evaluating `f(u, v)` for every texel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, RasterError>
    where
        F: FnMut(u32, u32) -> P::Word,
    {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for v in 0..height {
            for u in 0..width {
                pixels.push(f(u, v));
            }
        }
        Self::new(width, height, pixels)
    }

    /// Checkerboard of `cell`-sized squares alternating two ARGB colors
    pub fn checkerboard(size: u32, cell: u32, even: u32, odd: u32) -> Result<Self, RasterError> {
        let cell = cell.max(1);
        let (even, odd) = (P::from_argb(even), P::from_argb(odd));
        Self::from_fn(size, size, |u, v| {
            if ((u / cell) + (v / cell)) % 2 == 0 {
                even
            } else {
                odd
            }
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[P::Word] {
        &self.pixels
    }

    /// Texel at integer coordinates, wrapping
    #[inline]
    pub fn texel(&self, u: u32, v: u32) -> P::Word {
        self.pixels[(((v & self.mask[1]) << self.width_log2) | (u & self.mask[0])) as usize]
    }

    /// Texel addressed by fixed-point texture coordinates
    #[inline(always)]
    pub fn sample(&self, s: i32, t: i32) -> P::Word {
        let u = ((s as u32) >> self.shift[0]) & self.mask[0];
        let v = ((t as u32) >> self.shift[1]) & self.mask[1];
        self.pixels[((v << self.width_log2) | u) as usize]
    }

    /// Replace the texels with a block of the framebuffer
    ///
    /// Texel (u, v) receives surface pixel `((x + u) % width, (y + v) % height)`.
    /// Rows are copied in parallel with the `parallel` feature.
    pub fn copy_from_surface(&mut self, surface: &Surface<P>, x: u32, y: u32) {
        let tex_width = self.width as usize;
        let (surf_width, surf_height) = (surface.width() as usize, surface.height() as usize);
        let copy_row = |v: usize, out: &mut [P::Word]| {
            let row = surface.row((y as usize + v) % surf_height);
            for (u, texel) in out.iter_mut().enumerate() {
                *texel = row[(x as usize + u) % surf_width];
            }
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.pixels
                .par_chunks_mut(tex_width)
                .enumerate()
                .for_each(|(v, out)| copy_row(v, out));
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.pixels
                .chunks_mut(tex_width)
                .enumerate()
                .for_each(|(v, out)| copy_row(v, out));
        }

        crate::logging::log(
            crate::logging::LogCategory::Texture,
            crate::logging::LogLevel::Debug,
            || {
                format!(
                    "copied {}x{} texels from framebuffer at ({}, {})",
                    self.width, self.height, x, y
                )
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{ColorOps, PixelMode, Rgb565, Xrgb8888};

    #[test]
    fn test_rejects_bad_sizes() {
        assert_eq!(
            TexelSource::<Xrgb8888>::new(3, 4, vec![0; 12]).unwrap_err(),
            RasterError::TextureNotPowerOfTwo {
                width: 3,
                height: 4
            }
        );
        assert!(matches!(
            TexelSource::<Xrgb8888>::new(4, 4, vec![0; 15]),
            Err(RasterError::TextureSizeMismatch { expected: 16, .. })
        ));
        assert!(TexelSource::<Rgb565>::from_rgb8(2, 2, &[0; 11]).is_err());
    }

    #[test]
    fn test_sample_addressing() {
        // Texel value encodes its own coordinates
        let tex = TexelSource::<Xrgb8888>::from_fn(8, 4, |u, v| (u << 8) | v).unwrap();

        let one = 1i32 << TEXCOORD_BITS;
        assert_eq!(tex.sample(0, 0), 0);
        // s = 0.5 selects column 4, t = 0.75 selects row 3
        assert_eq!(tex.sample(one / 2, one / 4 * 3), (4 << 8) | 3);
        // Coordinates wrap
        assert_eq!(tex.sample(one + one / 8, 0), 1 << 8);
        assert_eq!(tex.sample(-1, -1), (7 << 8) | 3);
        assert_eq!(tex.texel(9, 5), (1 << 8) | 1);
    }

    #[test]
    fn test_checkerboard() {
        let white = ColorOps::from_rgb(255, 255, 255);
        let tex = TexelSource::<Rgb565>::checkerboard(4, 2, white, 0xFF000000).unwrap();
        assert_eq!(tex.texel(0, 0), 0xFFFF);
        assert_eq!(tex.texel(2, 0), 0x0000);
        assert_eq!(tex.texel(2, 2), 0xFFFF);
    }

    #[test]
    fn test_copy_from_surface_wraps() {
        let mut surface = Surface::<Xrgb8888>::open(4, 2, PixelMode::Rgba32, None).unwrap();
        surface.clear(None, Some(ColorOps::from_rgb(0, 0, 9)));
        surface.plot_point(&crate::ScreenPoint::new(3, 1, 0).with_rgb8(7, 0, 0));

        let mut tex = TexelSource::<Xrgb8888>::new(4, 4, vec![0; 16]).unwrap();
        tex.copy_from_surface(&surface, 2, 0);

        // Column 1 of the texture is surface column 3; rows wrap every 2
        assert_eq!(tex.texel(1, 1), 0x0007_0000);
        assert_eq!(tex.texel(1, 3), 0x0007_0000);
        assert_eq!(tex.texel(0, 1), 0x0000_0009);
        assert_eq!(tex.texel(3, 0), 0x0000_0009);
    }
}
