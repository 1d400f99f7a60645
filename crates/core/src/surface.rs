//! Depth + color surface
//!
//! A [`Surface`] owns a depth buffer and either owns its color buffer or
//! holds one lent by the caller. The color buffer is row-major with a stride
//! (in pixels) that may exceed the width; the depth buffer is always exactly
//! `width * height`.
//!
//! Widths are rounded down to a multiple of 4 pixels. At open the stride is the
//! requested (unrounded) width, after a resize it is the rounded width.
//!
//! # Usage
//!
//! ```
//! use softraster_core::{ColorOps, PixelMode, Rgb565, Surface};
//!
//! let mut surface = Surface::<Rgb565>::open(320, 240, PixelMode::Rgb565, None)?;
//! surface.clear(Some(0), Some(ColorOps::from_rgb(0, 0, 0)));
//!
//! let mut frame = vec![0u8; 320 * 240 * 4];
//! surface.copy_out::<softraster_core::Xrgb8888>(&mut frame, 320 * 4);
//! # Ok::<(), softraster_core::RasterError>(())
//! ```

use crate::dirty::{DirtyRect, DirtyRegion};
use crate::graphics::color::convert;
use crate::graphics::{BlendState, DepthBuffer, PixelFormat, PixelMode, StipplePattern};
use crate::logging::{log, LogCategory, LogLevel};
use crate::texture::TexelSource;
use crate::{try_alloc, RasterError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Per-draw-call rendering state
///
/// Read once at the start of every primitive to pick the specialized
/// rasterizer; changing it between primitives is cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderState {
    /// Reject fragments whose depth is less than the stored one
    pub depth_test: bool,
    /// Store the depth of fragments that pass
    pub depth_write: bool,
    pub blend: BlendState,
    /// Polygon stipple, triangles only
    pub stipple: Option<StipplePattern>,
    /// Side of the square drawn by `plot_point`
    pub point_size: u32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            blend: BlendState::default(),
            stipple: None,
            point_size: 1,
        }
    }
}

enum ColorBuffer<W> {
    Owned(Vec<W>),
    /// Lent by the caller, handed back on close or resize
    External(Vec<W>),
}

impl<W> ColorBuffer<W> {
    fn as_slice(&self) -> &[W] {
        match self {
            ColorBuffer::Owned(buf) | ColorBuffer::External(buf) => buf,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [W] {
        match self {
            ColorBuffer::Owned(buf) | ColorBuffer::External(buf) => buf,
        }
    }

    fn into_external(self) -> Option<Vec<W>> {
        match self {
            ColorBuffer::Owned(_) => None,
            ColorBuffer::External(buf) => Some(buf),
        }
    }
}

/// Borrowed view of everything a rasterizer writes or reads
pub(crate) struct RasterTarget<'a, P: PixelFormat> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub color: &'a mut [P::Word],
    pub depth: &'a mut [u16],
    pub state: &'a RenderState,
    pub texture: Option<&'a TexelSource<P>>,
}

/// Depth + color surface in pixel format `P`
pub struct Surface<P: PixelFormat> {
    width: u32,
    height: u32,
    /// Color buffer row pitch in pixels
    stride: usize,
    color: ColorBuffer<P::Word>,
    depth: DepthBuffer,
    state: RenderState,
    texture: Option<Arc<TexelSource<P>>>,
    dirty: DirtyRegion,
}

fn rounded_dimensions(width: u32, height: u32) -> Result<u32, RasterError> {
    let rounded = width & !3;
    if rounded == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    Ok(rounded)
}

fn color_len(stride: usize, height: u32) -> Result<usize, RasterError> {
    stride
        .checked_mul(height as usize)
        .ok_or(RasterError::Allocation {
            what: "color buffer",
            bytes: usize::MAX,
        })
}

fn color_buffer<W: Default + Clone>(
    external: Option<Vec<W>>,
    required: usize,
) -> Result<ColorBuffer<W>, RasterError> {
    match external {
        Some(buf) if buf.len() < required => Err(RasterError::BufferTooSmall {
            len: buf.len(),
            required,
        }),
        Some(buf) => Ok(ColorBuffer::External(buf)),
        None => Ok(ColorBuffer::Owned(try_alloc(
            required,
            W::default(),
            "color buffer",
        )?)),
    }
}

impl<P: PixelFormat> Surface<P> {
    /// Open a surface of (at least 4 x 1) pixels
    ///
    /// `mode` must match the surface's pixel format. When `external` is given
    /// it becomes the color buffer and must hold `width * height` pixels;
    /// otherwise a buffer is allocated. Contents are unspecified until the
    /// first [`clear`](Self::clear).
    ///
    /// # Errors
    ///
    /// * [`RasterError::UnsupportedMode`] - `mode` is not `P::MODE`
    /// * [`RasterError::InvalidDimensions`] - width < 4 or height == 0
    /// * [`RasterError::BufferTooSmall`] - external buffer too short
    /// * [`RasterError::Allocation`] - a buffer could not be allocated
    pub fn open(
        width: u32,
        height: u32,
        mode: PixelMode,
        external: Option<Vec<P::Word>>,
    ) -> Result<Self, RasterError> {
        let result = Self::try_open(width, height, mode, external);
        match &result {
            Ok(surface) => log(LogCategory::Surface, LogLevel::Info, || {
                format!(
                    "Opened {}x{} {} surface (stride {} bytes, {} color buffer)",
                    surface.width,
                    surface.height,
                    P::NAME,
                    surface.stride_bytes(),
                    if surface.is_external() {
                        "external"
                    } else {
                        "owned"
                    }
                )
            }),
            Err(err) => log(LogCategory::Surface, LogLevel::Error, || {
                format!("Failed to open {}x{} surface: {}", width, height, err)
            }),
        }
        result
    }

    fn try_open(
        width: u32,
        height: u32,
        mode: PixelMode,
        external: Option<Vec<P::Word>>,
    ) -> Result<Self, RasterError> {
        if mode != P::MODE {
            return Err(RasterError::UnsupportedMode {
                requested: mode,
                supported: P::MODE,
            });
        }
        let rounded = rounded_dimensions(width, height)?;
        let stride = width as usize;
        let color = color_buffer(external, color_len(stride, height)?)?;
        let depth = DepthBuffer::try_new(rounded, height)?;

        Ok(Self {
            width: rounded,
            height,
            stride,
            color,
            depth,
            state: RenderState::default(),
            texture: None,
            dirty: DirtyRegion::default(),
        })
    }

    /// Reallocate for new dimensions
    ///
    /// Every new buffer is allocated before anything is released; on error the
    /// surface keeps its previous buffers and dimensions. Contents are not
    /// preserved. Returns the previously lent color buffer, if any.
    pub fn resize(
        &mut self,
        external: Option<Vec<P::Word>>,
        width: u32,
        height: u32,
    ) -> Result<Option<Vec<P::Word>>, RasterError> {
        let prepared = rounded_dimensions(width, height).and_then(|rounded| {
            let stride = rounded as usize;
            let color = color_buffer(external, color_len(stride, height)?)?;
            let depth = DepthBuffer::try_new(rounded, height)?;
            Ok((rounded, stride, color, depth))
        });

        let (rounded, stride, color, depth) = match prepared {
            Ok(buffers) => buffers,
            Err(err) => {
                log(LogCategory::Surface, LogLevel::Warn, || {
                    format!(
                        "Resize to {}x{} failed ({}), keeping {}x{}",
                        width, height, err, self.width, self.height
                    )
                });
                return Err(err);
            }
        };

        let previous = std::mem::replace(&mut self.color, color);
        self.depth = depth;
        self.width = rounded;
        self.height = height;
        self.stride = stride;
        self.dirty = DirtyRegion::default();

        log(LogCategory::Surface, LogLevel::Info, || {
            format!("Resized surface to {}x{}", self.width, self.height)
        });
        Ok(previous.into_external())
    }

    /// Release the surface, handing back a lent color buffer
    pub fn close(self) -> Option<Vec<P::Word>> {
        log(LogCategory::Surface, LogLevel::Debug, || {
            format!("Closed {}x{} surface", self.width, self.height)
        });
        self.color.into_external()
    }

    /// Fill the depth buffer and/or the color buffer
    ///
    /// `color` is ARGB8888; only the first `width` pixels of each row are
    /// written, padding past the width is left alone.
    pub fn clear(&mut self, depth: Option<u16>, color: Option<u32>) {
        if let Some(value) = depth {
            self.depth.clear(value);
        }
        if let Some(argb) = color {
            let packed = P::from_argb(argb);
            let width = self.width as usize;
            self.color
                .as_mut_slice()
                .chunks_mut(self.stride)
                .take(self.height as usize)
                .for_each(|row| row[..width].fill(packed));
            self.mark_dirty(DirtyRect::full(self.width, self.height));
        }
    }

    /// Copy the whole color buffer into `dest`, converting to format `D`
    ///
    /// `dest_stride` is in bytes and must be at least `width * D::BYTES`.
    ///
    /// # Panics
    ///
    /// If `dest` cannot hold `height` rows of `dest_stride` bytes (the last
    /// row only needs `width * D::BYTES`).
    pub fn copy_out<D: PixelFormat>(&self, dest: &mut [u8], dest_stride: usize) {
        self.copy_region::<D>(dest, dest_stride, DirtyRect::full(self.width, self.height), None);
    }

    /// Like [`copy_out`](Self::copy_out) but leaves destination pixels alone
    /// wherever the surface holds exactly the color `key` (ARGB8888)
    pub fn copy_out_keyed<D: PixelFormat>(&self, dest: &mut [u8], dest_stride: usize, key: u32) {
        self.copy_region::<D>(
            dest,
            dest_stride,
            DirtyRect::full(self.width, self.height),
            Some(P::from_argb(key)),
        );
    }

    /// Copy only `rect` (clipped to the surface) into a full-frame `dest`
    pub fn copy_out_rect<D: PixelFormat>(&self, dest: &mut [u8], dest_stride: usize, rect: DirtyRect) {
        let Some(rect) = DirtyRect::clipped(
            rect.x_min as i32,
            rect.y_min as i32,
            rect.x_max as i32,
            rect.y_max as i32,
            self.width,
            self.height,
        ) else {
            return;
        };
        self.copy_region::<D>(dest, dest_stride, rect, None);
    }

    fn copy_region<D: PixelFormat>(
        &self,
        dest: &mut [u8],
        dest_stride: usize,
        rect: DirtyRect,
        key: Option<P::Word>,
    ) {
        let row_bytes = self.width as usize * D::BYTES;
        assert!(
            dest_stride >= row_bytes,
            "destination stride {} is smaller than a row ({} bytes)",
            dest_stride,
            row_bytes
        );
        let required = (self.height as usize - 1) * dest_stride + row_bytes;
        assert!(
            dest.len() >= required,
            "destination holds {} bytes, {} required",
            dest.len(),
            required
        );

        let (x0, x1) = (rect.x_min as usize, rect.x_max as usize + 1);
        let y0 = rect.y_min as usize;
        let rows = rect.height() as usize;
        let copy_row = |y: usize, out: &mut [u8]| {
            copy_span::<P, D>(
                &self.row(y)[x0..x1],
                &mut out[x0 * D::BYTES..x1 * D::BYTES],
                key,
            );
        };
        let dest = &mut dest[y0 * dest_stride..];

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            dest.par_chunks_mut(dest_stride)
                .take(rows)
                .enumerate()
                .for_each(|(i, out)| copy_row(y0 + i, out));
        }
        #[cfg(not(feature = "parallel"))]
        {
            dest.chunks_mut(dest_stride)
                .take(rows)
                .enumerate()
                .for_each(|(i, out)| copy_row(y0 + i, out));
        }
    }

    /// Share a texture with the textured rasterizers, `None` unbinds
    pub fn bind_texture(&mut self, texture: Option<Arc<TexelSource<P>>>) {
        log(LogCategory::Texture, LogLevel::Debug, || match &texture {
            Some(tex) => format!("Bound {}x{} texture", tex.width(), tex.height()),
            None => "Unbound texture".to_string(),
        });
        self.texture = texture;
    }

    pub fn texture(&self) -> Option<&Arc<TexelSource<P>>> {
        self.texture.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row pitch of the color buffer in pixels
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn stride_bytes(&self) -> usize {
        self.stride * P::BYTES
    }

    pub fn mode(&self) -> PixelMode {
        P::MODE
    }

    /// Whether the color buffer was lent by the caller
    pub fn is_external(&self) -> bool {
        matches!(self.color, ColorBuffer::External(_))
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    /// The visible `width` pixels of row `y`
    pub fn row(&self, y: usize) -> &[P::Word] {
        let start = y * self.stride;
        &self.color.as_slice()[start..start + self.width as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<P::Word> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.row(y as usize)[x as usize])
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<u16> {
        self.depth.read(x, y)
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Bounding box of everything drawn since the last call
    ///
    /// Always `None` without the `dirty-rect` feature.
    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.dirty.take()
    }

    pub fn dirty(&self) -> Option<DirtyRect> {
        self.dirty.get()
    }

    #[inline]
    pub(crate) fn mark_dirty(&mut self, rect: DirtyRect) {
        #[cfg(feature = "dirty-rect")]
        self.dirty.mark(rect);
        #[cfg(not(feature = "dirty-rect"))]
        let _ = rect;
    }

    pub(crate) fn target(&mut self) -> RasterTarget<'_, P> {
        RasterTarget {
            width: self.width as usize,
            height: self.height as usize,
            stride: self.stride,
            color: self.color.as_mut_slice(),
            depth: self.depth.as_mut_slice(),
            state: &self.state,
            texture: self.texture.as_deref(),
        }
    }

    /// Snapshot of dimensions and render state for debugging
    pub fn debug_state(&self) -> Value {
        json!({
            "width": self.width,
            "height": self.height,
            "stride_bytes": self.stride_bytes(),
            "format": P::NAME,
            "mode": P::MODE,
            "external": self.is_external(),
            "texture": self.texture.as_ref().map(|t| json!({
                "width": t.width(),
                "height": t.height(),
            })),
            "dirty": self.dirty.get(),
            "state": serde_json::to_value(&self.state).unwrap_or(Value::Null),
        })
    }
}

/// Convert one run of pixels into destination bytes
fn copy_span<P: PixelFormat, D: PixelFormat>(src: &[P::Word], out: &mut [u8], key: Option<P::Word>) {
    if key.is_none() && P::MODE == D::MODE {
        out.copy_from_slice(bytemuck::cast_slice(src));
        return;
    }
    for (px, bytes) in src.iter().zip(out.chunks_exact_mut(D::BYTES)) {
        if key == Some(*px) {
            continue;
        }
        let word = convert::<P, D>(*px);
        bytes.copy_from_slice(bytemuck::bytes_of(&word));
    }
}
