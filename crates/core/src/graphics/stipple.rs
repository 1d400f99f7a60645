//! Polygon stipple mask
//!
//! A 32x32 bit pattern repeated over the whole surface. A triangle pixel at
//! screen position (x, y) is only drawn when bit `x & 31` of row `y & 31` is set.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StipplePattern {
    rows: [u32; 32],
}

impl StipplePattern {
    /// Pattern with every bit set
    pub const SOLID: StipplePattern = StipplePattern { rows: [u32::MAX; 32] };

    pub fn from_rows(rows: [u32; 32]) -> Self {
        Self { rows }
    }

    /// Build from the 128-byte GL layout: four bytes per row, least
    /// significant bit of each byte first.
    pub fn from_bytes(bytes: &[u8; 128]) -> Self {
        let mut rows = [0u32; 32];
        for (row, chunk) in rows.iter_mut().zip(bytes.chunks_exact(4)) {
            *row = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self { rows }
    }

    /// Checkerboard of `cell`-sized squares (`cell` is clamped to 1..=16)
    pub fn checkerboard(cell: u32) -> Self {
        let cell = cell.clamp(1, 16);
        let mut rows = [0u32; 32];
        for (y, row) in rows.iter_mut().enumerate() {
            for x in 0..32u32 {
                if ((x / cell) + (y as u32 / cell)) % 2 == 0 {
                    *row |= 1 << x;
                }
            }
        }
        Self { rows }
    }

    #[inline(always)]
    pub fn covers(&self, x: i32, y: i32) -> bool {
        (self.rows[(y & 31) as usize] >> (x & 31)) & 1 != 0
    }
}

impl Default for StipplePattern {
    fn default() -> Self {
        Self::SOLID
    }
}
