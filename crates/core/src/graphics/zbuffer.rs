//! Depth buffer for hidden surface removal
//!
//! Stores one 16-bit depth value per pixel. Larger values are nearer to the
//! viewer: an incoming fragment passes the depth test when its depth is
//! greater than or equal to the stored one. A freshly allocated buffer is all
//! zeros, which is the far plane.
//!
//! # Usage
//!
//! ```
//! use softraster_core::graphics::DepthBuffer;
//!
//! let mut depth = DepthBuffer::try_new(320, 240).unwrap();
//! depth.clear(0x8000);
//! assert_eq!(depth.read(100, 100), Some(0x8000));
//! ```

use crate::{try_alloc, RasterError};

/// Depth buffer storage
///
/// Stored in row-major order without padding: index = y * width + x
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    buffer: Vec<u16>,
}

impl DepthBuffer {
    /// Allocate a zeroed (far plane) depth buffer
    ///
    /// Fails with [`RasterError::Allocation`] instead of aborting when the
    /// allocation cannot be satisfied.
    pub fn try_new(width: u32, height: u32) -> Result<Self, RasterError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RasterError::Allocation {
                what: "depth buffer",
                bytes: usize::MAX,
            })?;
        Ok(Self {
            width,
            height,
            buffer: try_alloc(len, 0u16, "depth buffer")?,
        })
    }

    /// Fill the whole buffer with `value`
    ///
    /// # Performance
    ///
    /// When both bytes of `value` are equal (0x0000 and 0xFFFF being the
    /// common cases) the fill degrades to a plain byte fill.
    pub fn clear(&mut self, value: u16) {
        let [lo, hi] = value.to_ne_bytes();
        if lo == hi {
            bytemuck::cast_slice_mut::<u16, u8>(&mut self.buffer).fill(lo);
        } else {
            self.buffer.fill(value);
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read depth value at a specific pixel
    ///
    /// Returns `None` if coordinates are out of bounds
    pub fn read(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.buffer.get(self.index(x, y)).copied()
    }

    #[inline(always)]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.buffer
    }

    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        &mut self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_buffer_creation() {
        let depth = DepthBuffer::try_new(320, 240).unwrap();
        assert_eq!(depth.width(), 320);
        assert_eq!(depth.height(), 240);
        assert_eq!(depth.as_slice().len(), 320 * 240);
        // New buffers start at the far plane
        assert!(depth.as_slice().iter().all(|&d| d == 0));
    }

    #[test]
    fn test_depth_buffer_clear_patterns() {
        let mut depth = DepthBuffer::try_new(8, 4).unwrap();

        // Byte-fill fast paths
        depth.clear(0xFFFF);
        assert!(depth.as_slice().iter().all(|&d| d == 0xFFFF));
        depth.clear(0xABAB);
        assert!(depth.as_slice().iter().all(|&d| d == 0xABAB));
        depth.clear(0);
        assert!(depth.as_slice().iter().all(|&d| d == 0));

        // General path
        depth.clear(0x1234);
        assert!(depth.as_slice().iter().all(|&d| d == 0x1234));
    }

    #[test]
    fn test_depth_buffer_bounds_checking() {
        let depth = DepthBuffer::try_new(10, 10).unwrap();
        assert_eq!(depth.read(100, 100), None);
        assert_eq!(depth.read(10, 0), None);
    }

    #[test]
    fn test_depth_buffer_allocation_failure_is_reported() {
        let result = DepthBuffer::try_new(u32::MAX, u32::MAX);
        assert!(matches!(result, Err(RasterError::Allocation { .. })));
    }
}
