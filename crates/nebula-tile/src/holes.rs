//! Terrain hole masks at 4×4 or 8×8 resolution.
//!
//! The resolution is chosen by the chunk's high-resolution-holes flag and is
//! never inferred from the stored bits. Cells are packed row-major, least
//! significant bit first: bit `row * side + col`.

/// Side length of the legacy hole grid.
pub const LOW_RES_SIDE: usize = 4;

/// Side length of the high-resolution hole grid.
pub const HIGH_RES_SIDE: usize = 8;

/// A chunk's hole mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HoleMask {
    bits: u64,
    high_res: bool,
}

impl HoleMask {
    /// Creates a 4×4 mask from its 16-bit packed form.
    pub fn low_res(bits: u16) -> Self {
        Self {
            bits: u64::from(bits),
            high_res: false,
        }
    }

    /// Creates an 8×8 mask from its 64-bit packed form.
    pub fn high_res(bits: u64) -> Self {
        Self {
            bits,
            high_res: true,
        }
    }

    /// Creates a mask with no holes at the given resolution.
    pub fn empty(high_res: bool) -> Self {
        Self { bits: 0, high_res }
    }

    /// Decodes a raw hole field. Only the low 16 bits are used when
    /// `high_res` is false.
    pub fn decode(raw: u64, high_res: bool) -> Self {
        if high_res {
            Self::high_res(raw)
        } else {
            Self::low_res(raw as u16)
        }
    }

    /// Returns the packed form (16 significant bits for low resolution).
    pub fn encode(&self) -> u64 {
        self.bits
    }

    pub fn is_high_res(&self) -> bool {
        self.high_res
    }

    /// Grid side length: 4 or 8.
    pub fn side(&self) -> usize {
        if self.high_res {
            HIGH_RES_SIDE
        } else {
            LOW_RES_SIDE
        }
    }

    /// Returns `true` if the mask has no holes.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns whether cell `(row, col)` is a hole. Out-of-range cells are solid.
    pub fn get(&self, row: usize, col: usize) -> bool {
        let side = self.side();
        if row >= side || col >= side {
            return false;
        }
        self.bits & (1u64 << (row * side + col)) != 0
    }

    /// Marks or clears a hole at `(row, col)`. Out-of-range cells are ignored.
    pub fn set(&mut self, row: usize, col: usize, hole: bool) {
        let side = self.side();
        if row >= side || col >= side {
            tracing::warn!("HoleMask::set out of bounds: ({}, {}) in {}x{}", row, col, side, side);
            return;
        }
        let bit = 1u64 << (row * side + col);
        if hole {
            self.bits |= bit;
        } else {
            self.bits &= !bit;
        }
    }

    /// Returns the mask as a row-major boolean grid.
    pub fn to_grid(&self) -> Vec<Vec<bool>> {
        let side = self.side();
        (0..side)
            .map(|row| (0..side).map(|col| self.get(row, col)).collect())
            .collect()
    }

    /// Builds a mask from a square 4×4 or 8×8 boolean grid.
    ///
    /// Returns `None` for any other shape.
    pub fn from_grid(grid: &[Vec<bool>]) -> Option<Self> {
        let side = grid.len();
        if side != LOW_RES_SIDE && side != HIGH_RES_SIDE {
            return None;
        }
        let mut mask = Self::empty(side == HIGH_RES_SIDE);
        for (row, cells) in grid.iter().enumerate() {
            if cells.len() != side {
                return None;
            }
            for (col, &hole) in cells.iter().enumerate() {
                mask.set(row, col, hole);
            }
        }
        Some(mask)
    }

    /// Converts to 8×8, expanding each low-resolution cell into 2×2.
    pub fn to_high_res(&self) -> Self {
        if self.high_res {
            return *self;
        }
        let mut out = Self::empty(true);
        for row in 0..HIGH_RES_SIDE {
            for col in 0..HIGH_RES_SIDE {
                out.set(row, col, self.get(row / 2, col / 2));
            }
        }
        out
    }

    /// Converts to 4×4. A low-resolution cell becomes a hole only when all
    /// four covered high-resolution cells are holes.
    pub fn to_low_res(&self) -> Self {
        if !self.high_res {
            return *self;
        }
        let mut out = Self::empty(false);
        for row in 0..LOW_RES_SIDE {
            for col in 0..LOW_RES_SIDE {
                let all = (0..2).all(|dr| (0..2).all(|dc| self.get(row * 2 + dr, col * 2 + dc)));
                out.set(row, col, all);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
