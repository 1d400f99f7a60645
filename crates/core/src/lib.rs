//! Software rasterization core.
//!
//! A [`Surface`] owns a packed color buffer and a 16-bit depth buffer. Screen
//! space [`ScreenPoint`]s (already transformed, clipped and mapped to the
//! viewport) are turned into pixels by the point, line and triangle
//! rasterizers in [`raster`]. Depth test, depth write, blending and polygon
//! stipple are resolved once per primitive through static dispatch tables of
//! monomorphized span loops.

pub mod dirty;
pub mod graphics;
pub mod logging;
pub mod point;
pub mod raster;
pub mod renderer;
pub mod surface;
pub mod texture;

pub use graphics::{ColorOps, PixelFormat, PixelMode, Rgb24, Rgb565, Xrgb8888};
pub use point::ScreenPoint;
pub use raster::Shading;
pub use renderer::{open_renderer, Renderer};
pub use surface::{RenderState, Surface};
pub use texture::TexelSource;

use thiserror::Error;

/// Errors reported by surface and texture management
///
/// Drawing calls never fail; their preconditions are the caller's job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("Unsupported pixel mode {requested:?} (surface type is {supported:?})")]
    UnsupportedMode {
        requested: PixelMode,
        supported: PixelMode,
    },

    #[error("Invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("External framebuffer holds {len} pixels, {required} required")]
    BufferTooSmall { len: usize, required: usize },

    #[error("Failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },

    #[error("Texture dimensions {width}x{height} are not powers of two")]
    TextureNotPowerOfTwo { width: u32, height: u32 },

    #[error("Texture has {len} texels, {width}x{height} requires {expected}")]
    TextureSizeMismatch {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },
}

/// Allocate `len` copies of `fill` without aborting on failure
pub(crate) fn try_alloc<T: Clone>(
    len: usize,
    fill: T,
    what: &'static str,
) -> Result<Vec<T>, RasterError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RasterError::Allocation {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buffer.resize(len, fill);
    Ok(buffer)
}
