//! Chunk liquid in its two on-disk generations.
//!
//! Modern liquid lives in a tile-level block with one header per chunk and any
//! number of layers; legacy liquid is a fixed 804-byte record inside the chunk
//! payload. Which one a chunk carries is decided once at decode time and kept
//! as a [`LiquidBlock`] variant.

mod convert;
mod legacy;
mod modern;

use serde::{Deserialize, Serialize};

pub use legacy::{
    FLOW_VECTOR_COUNT, FlowVector, LEGACY_LIQUID_SIZE, LegacyLiquid, LegacyVertex,
    LegacyVertexData,
};
pub use modern::{
    LIQUID_GRID_SIDE, LIQUID_VERTEX_COUNT, LIQUID_VERTEX_SIDE, LiquidLayer, LiquidRect,
    LiquidVertex, LiquidVertexFormat, ModernLiquid,
};

pub(crate) use convert::{legacy_to_modern, modern_to_legacy, set_legacy_flags};
pub(crate) use legacy::{decode_legacy, encode_legacy};
pub(crate) use modern::{decode_modern_block, encode_modern_block};

/// The liquid carried by one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum LiquidBlock {
    /// Layered liquid from the tile-level liquid block.
    Modern(ModernLiquid),
    /// Single-layer liquid embedded in the chunk.
    Legacy(LegacyLiquid),
}

impl LiquidBlock {
    /// Returns the modern payload, if this is modern liquid.
    pub fn as_modern(&self) -> Option<&ModernLiquid> {
        match self {
            Self::Modern(liquid) => Some(liquid),
            Self::Legacy(_) => None,
        }
    }

    /// Returns the legacy payload, if this is legacy liquid.
    pub fn as_legacy(&self) -> Option<&LegacyLiquid> {
        match self {
            Self::Legacy(liquid) => Some(liquid),
            Self::Modern(_) => None,
        }
    }
}

/// Which liquid generation the encoder writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidFormat {
    /// Write each chunk's liquid in the generation it was decoded from.
    #[default]
    Preserve,
    /// Convert legacy liquid to a single modern layer.
    Modern,
    /// Convert modern liquid to legacy, keeping only the first layer.
    Legacy,
}

/// Basic liquid kind shared by both generations.
///
/// Legacy records store it in the low two bits of each tile byte; modern
/// layers store a liquid type id that maps onto it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LiquidKind {
    #[default]
    Water,
    Ocean,
    Magma,
    Slime,
}

impl LiquidKind {
    /// Reads the kind from a legacy tile's liquid type bits.
    pub fn from_legacy_type(liquid_type: u8) -> Self {
        match liquid_type & 0x3 {
            0 => Self::Water,
            1 => Self::Ocean,
            2 => Self::Magma,
            _ => Self::Slime,
        }
    }

    /// Legacy tile liquid type bits.
    pub fn legacy_type(self) -> u8 {
        match self {
            Self::Water => 0,
            Self::Ocean => 1,
            Self::Magma => 2,
            Self::Slime => 3,
        }
    }

    /// Maps a modern liquid type id. Unknown ids are treated as water.
    pub fn from_liquid_id(id: u16) -> Self {
        match id {
            2 | 14 => Self::Ocean,
            3 | 15 | 19 => Self::Magma,
            4 | 20 => Self::Slime,
            _ => Self::Water,
        }
    }

    /// The basic modern liquid type id for this kind.
    pub fn liquid_id(self) -> u16 {
        match self {
            Self::Water => 1,
            Self::Ocean => 2,
            Self::Magma => 3,
            Self::Slime => 4,
        }
    }

    /// Magma and slime store texture coordinates instead of water depth.
    pub fn is_magma_style(self) -> bool {
        matches!(self, Self::Magma | Self::Slime)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
