//! Dirty-rectangle tracking
//!
//! With the `dirty-rect` feature every primitive grows the surface's dirty
//! rectangle by its screen-space bounding box, so a frontend can copy out only
//! the pixels that changed since the last [`Surface::take_dirty`](crate::Surface::take_dirty).

use serde::{Deserialize, Serialize};

/// Inclusive pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyRect {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl DirtyRect {
    /// Rectangle covering a whole `width` x `height` surface
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x_min: 0,
            y_min: 0,
            x_max: width.saturating_sub(1),
            y_max: height.saturating_sub(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &DirtyRect) -> DirtyRect {
        DirtyRect {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Clip an arbitrary (possibly inverted) box to a surface, `None` when it
    /// lies entirely outside
    pub fn clipped(x0: i32, y0: i32, x1: i32, y1: i32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let (x_min, x_max) = (x0.min(x1), x0.max(x1));
        let (y_min, y_max) = (y0.min(y1), y0.max(y1));
        let right = width as i64 - 1;
        let bottom = height as i64 - 1;
        if x_max < 0 || y_max < 0 || x_min as i64 > right || y_min as i64 > bottom {
            return None;
        }
        Some(DirtyRect {
            x_min: x_min.max(0) as u32,
            y_min: y_min.max(0) as u32,
            x_max: (x_max as i64).min(right) as u32,
            y_max: (y_max as i64).min(bottom) as u32,
        })
    }
}

/// Accumulated damage since the last take
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyRegion {
    rect: Option<DirtyRect>,
}

impl DirtyRegion {
    pub fn mark(&mut self, rect: DirtyRect) {
        self.rect = Some(match self.rect {
            Some(current) => current.union(&rect),
            None => rect,
        });
    }

    pub fn get(&self) -> Option<DirtyRect> {
        self.rect
    }

    pub fn take(&mut self) -> Option<DirtyRect> {
        self.rect.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipped_normalizes_and_clips() {
        let rect = DirtyRect::clipped(70, 10, -5, 3, 64, 32).unwrap();
        assert_eq!(
            rect,
            DirtyRect {
                x_min: 0,
                y_min: 3,
                x_max: 63,
                y_max: 10
            }
        );
        assert_eq!(rect.width(), 64);
        assert_eq!(rect.height(), 8);

        assert_eq!(DirtyRect::clipped(-10, -10, -1, -1, 64, 32), None);
        assert_eq!(DirtyRect::clipped(64, 0, 80, 5, 64, 32), None);
    }

    #[test]
    fn test_region_accumulates_union() {
        let mut region = DirtyRegion::default();
        assert_eq!(region.get(), None);

        region.mark(DirtyRect::clipped(2, 2, 4, 4, 16, 16).unwrap());
        region.mark(DirtyRect::clipped(10, 1, 12, 3, 16, 16).unwrap());

        let rect = region.take().unwrap();
        assert_eq!((rect.x_min, rect.y_min, rect.x_max, rect.y_max), (2, 1, 12, 4));
        assert!(rect.contains(12, 4));
        assert!(!rect.contains(13, 4));

        // Taking resets the region
        assert_eq!(region.take(), None);
    }
}
