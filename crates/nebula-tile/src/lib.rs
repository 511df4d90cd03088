//! Binary codec for terrain map tiles.
//!
//! A tile is a 16×16 grid of terrain chunks. Each chunk carries heights and
//! normals, up to four blended texture layers with alpha maps, a hole mask,
//! optional liquid in one of two on-disk generations, sound emitters and
//! references into the tile's doodad and object placement tables.
//!
//! [`decode_tile`] turns a buffer into a [`Tile`]; [`encode_tile`] lays the
//! tile out again under an [`EncodeConfig`], recomputing every offset and
//! size. Decoding is all-or-nothing, and encoding validates the whole tile
//! before writing anything.
//!
//! Alpha maps are quantized by their encoding, so a re-encoded tile decodes to
//! the same weights only up to the rounding documented in [`alpha`].

pub mod alpha;
pub mod bounds;
pub mod chunk;
pub mod config;
pub mod error;
pub mod flags;
pub mod holes;
mod io;
pub mod layer;
pub mod liquid;
pub mod names;
pub mod placement;
pub mod tile;

pub use alpha::{AlphaFormat, AlphaMap};
pub use bounds::FlightBounds;
pub use chunk::{Chunk, SoundEmitter};
pub use config::{EncodeConfig, HoleResolution};
pub use error::{DecodeError, EncodeError, LayerIssue, TableKind};
pub use flags::{ChunkFlags, LayerFlags, LiquidTileFlags, TextureFlags, TileFlags};
pub use holes::HoleMask;
pub use layer::TextureLayer;
pub use liquid::{
    LegacyLiquid, LiquidBlock, LiquidFormat, LiquidKind, LiquidLayer, LiquidRect, ModernLiquid,
};
pub use names::{NameResolver, NameTables};
pub use placement::{DoodadPlacement, ObjectPlacement};
pub use tile::{Tile, decode_tile, encode_tile, encode_tile_into};
