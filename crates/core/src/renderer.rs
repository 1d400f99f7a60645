//! Format-erased renderer trait
//!
//! [`Surface`] is generic over its pixel format so that every span loop is
//! compiled per format. Frontends that only learn the format at runtime (from
//! a config file or a command line flag) drive a `Box<dyn Renderer>` instead:
//!
//! ```text
//! PixelMode -> open_renderer -> Box<dyn Renderer> -> Surface<Rgb565 | Rgb24 | Xrgb8888>
//! ```
//!
//! # Usage
//!
//! ```
//! use softraster_core::{open_renderer, PixelMode, ScreenPoint, Shading};
//!
//! let mut renderer = open_renderer(PixelMode::Rgb565, 64, 64)?;
//! renderer.clear(Some(0), Some(0xFF000000));
//! renderer.fill_triangle(
//!     Shading::Smooth,
//!     &ScreenPoint::new(0, 0, 0).with_rgb8(255, 0, 0),
//!     &ScreenPoint::new(63, 0, 0).with_rgb8(0, 255, 0),
//!     &ScreenPoint::new(0, 63, 0).with_rgb8(0, 0, 255),
//! );
//!
//! let mut rgb = vec![0u8; 64 * 64 * 3];
//! renderer.read_rgb24(&mut rgb);
//! # Ok::<(), softraster_core::RasterError>(())
//! ```

use crate::dirty::DirtyRect;
use crate::graphics::{PixelFormat, PixelMode, Rgb24, Rgb565, Xrgb8888};
use crate::logging::{log, LogCategory, LogLevel};
use crate::point::ScreenPoint;
use crate::raster::Shading;
use crate::surface::{RenderState, Surface};
use crate::texture::TexelSource;
use crate::RasterError;
use serde_json::Value;
use std::sync::Arc;

/// Drawing interface shared by every surface format
pub trait Renderer: Send {
    /// Name of the backing format, for logs and UI
    fn name(&self) -> &str;

    fn mode(&self) -> PixelMode;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn state(&self) -> &RenderState;

    fn state_mut(&mut self) -> &mut RenderState;

    /// Fill depth and/or color (ARGB8888)
    fn clear(&mut self, depth: Option<u16>, color: Option<u32>);

    fn plot_point(&mut self, p: &ScreenPoint);

    fn draw_line(&mut self, p1: &ScreenPoint, p2: &ScreenPoint);

    fn fill_triangle(&mut self, shading: Shading, p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint);

    /// Convert and bind a tightly packed RGB888 image as the current texture
    fn bind_rgb_texture(&mut self, width: u32, height: u32, rgb: &[u8]) -> Result<(), RasterError>;

    fn unbind_texture(&mut self);

    /// Reallocate owned buffers; contents are lost
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError>;

    /// Copy the color buffer as tightly packed RGB888 rows
    ///
    /// `dest` must hold `width * height * 3` bytes.
    fn read_rgb24(&self, dest: &mut [u8]);

    /// Bounding box drawn since the last call
    fn take_dirty(&mut self) -> Option<DirtyRect>;

    fn debug_state(&self) -> Value;
}

impl<P: PixelFormat> Renderer for Surface<P> {
    fn name(&self) -> &str {
        P::NAME
    }

    fn mode(&self) -> PixelMode {
        P::MODE
    }

    fn width(&self) -> u32 {
        Surface::width(self)
    }

    fn height(&self) -> u32 {
        Surface::height(self)
    }

    fn state(&self) -> &RenderState {
        Surface::state(self)
    }

    fn state_mut(&mut self) -> &mut RenderState {
        Surface::state_mut(self)
    }

    fn clear(&mut self, depth: Option<u16>, color: Option<u32>) {
        Surface::clear(self, depth, color);
    }

    fn plot_point(&mut self, p: &ScreenPoint) {
        Surface::plot_point(self, p);
    }

    fn draw_line(&mut self, p1: &ScreenPoint, p2: &ScreenPoint) {
        Surface::draw_line(self, p1, p2);
    }

    fn fill_triangle(&mut self, shading: Shading, p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint) {
        Surface::fill_triangle(self, shading, p0, p1, p2);
    }

    fn bind_rgb_texture(&mut self, width: u32, height: u32, rgb: &[u8]) -> Result<(), RasterError> {
        let texture = TexelSource::<P>::from_rgb8(width, height, rgb)?;
        self.bind_texture(Some(Arc::new(texture)));
        Ok(())
    }

    fn unbind_texture(&mut self) {
        self.bind_texture(None);
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        Surface::resize(self, None, width, height).map(|_| ())
    }

    fn read_rgb24(&self, dest: &mut [u8]) {
        let stride = Surface::width(self) as usize * Rgb24::BYTES;
        self.copy_out::<Rgb24>(dest, stride);
    }

    fn take_dirty(&mut self) -> Option<DirtyRect> {
        Surface::take_dirty(self)
    }

    fn debug_state(&self) -> Value {
        Surface::debug_state(self)
    }
}

/// Open a surface in `mode` behind the format-erased trait
///
/// # Errors
///
/// [`RasterError::UnsupportedMode`] for [`PixelMode::Indexed`], plus every
/// error of [`Surface::open`].
pub fn open_renderer(mode: PixelMode, width: u32, height: u32) -> Result<Box<dyn Renderer>, RasterError> {
    log(LogCategory::Dispatch, LogLevel::Debug, || {
        format!("Opening {:?} renderer {}x{}", mode, width, height)
    });
    let renderer: Box<dyn Renderer> = match mode {
        PixelMode::Rgb565 => Box::new(Surface::<Rgb565>::open(width, height, mode, None)?),
        PixelMode::Rgb24 => Box::new(Surface::<Rgb24>::open(width, height, mode, None)?),
        PixelMode::Rgba32 => Box::new(Surface::<Xrgb8888>::open(width, height, mode, None)?),
        PixelMode::Indexed => {
            log(LogCategory::Dispatch, LogLevel::Error, || {
                "Indexed surfaces have no rasterizer".to_string()
            });
            return Err(RasterError::UnsupportedMode {
                requested: mode,
                supported: PixelMode::Rgba32,
            });
        }
    };
    Ok(renderer)
}
