//! Legacy single-layer liquid record embedded in a chunk.
//!
//! # Layout (804 bytes)
//!
//! | Offset | Size   | Field                                         |
//! |--------|--------|-----------------------------------------------|
//! | 0      | 4      | min height                                    |
//! | 4      | 4      | max height                                    |
//! | 8      | 81 × 8 | vertices: 4-byte payload, `f32` height        |
//! | 656    | 64     | tile flags, 8×8 row-major                     |
//! | 720    | 4      | declared flow vector count                    |
//! | 724    | 2 × 40 | flow vectors                                  |
//!
//! The vertex payload has no tag of its own. It holds texture coordinates
//! when the first rendered tile is magma or slime, and water depth and flow
//! otherwise. The record always stores two flow vectors whatever the declared
//! count says.

use glam::Vec3;

use crate::error::DecodeError;
use crate::flags::LiquidTileFlags;
use crate::io::{BlockBuilder, Region};

use super::LiquidKind;
use super::modern::{LIQUID_GRID_SIDE, LIQUID_VERTEX_COUNT};

/// Size of the legacy liquid record in bytes.
pub const LEGACY_LIQUID_SIZE: usize = 804;

/// Number of flow vectors stored in every record.
pub const FLOW_VECTOR_COUNT: usize = 2;

const TILE_COUNT: usize = LIQUID_GRID_SIDE * LIQUID_GRID_SIDE;

/// Per-vertex payload of a legacy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyVertexData {
    /// Water, ocean: depth and two flow percentages.
    Water { depth: u8, flow: [u8; 2], filler: u8 },
    /// Magma, slime: texture coordinates.
    Magma { u: u16, v: u16 },
}

impl Default for LegacyVertexData {
    fn default() -> Self {
        Self::Water {
            depth: 0,
            flow: [0; 2],
            filler: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LegacyVertex {
    pub data: LegacyVertexData,
    pub height: f32,
}

/// Authored flow descriptor for animated water.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowVector {
    pub position: Vec3,
    pub radius: f32,
    pub direction: Vec3,
    pub velocity: f32,
    pub amplitude: f32,
    pub frequency: f32,
}

/// Legacy liquid for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyLiquid {
    pub min_height: f32,
    pub max_height: f32,
    /// 9×9 vertex grid, row-major.
    pub vertices: [LegacyVertex; LIQUID_VERTEX_COUNT],
    /// 8×8 tile grid, row-major.
    pub tiles: [LiquidTileFlags; TILE_COUNT],
    /// Flow vector count as stored. Informational; the array size is fixed.
    pub declared_flow_count: u32,
    pub flows: [FlowVector; FLOW_VECTOR_COUNT],
}

impl LegacyLiquid {
    /// Creates a flat record of one kind with every tile rendered and fishable.
    pub fn new(kind: LiquidKind, height: f32) -> Self {
        let data = if kind.is_magma_style() {
            LegacyVertexData::Magma { u: 0, v: 0 }
        } else {
            LegacyVertexData::default()
        };
        let tile = LiquidTileFlags {
            liquid_type: kind.legacy_type(),
            fishable: true,
            ..LiquidTileFlags::default()
        };
        Self {
            min_height: height,
            max_height: height,
            vertices: [LegacyVertex { data, height }; LIQUID_VERTEX_COUNT],
            tiles: [tile; TILE_COUNT],
            declared_flow_count: 0,
            flows: [FlowVector::default(); FLOW_VECTOR_COUNT],
        }
    }

    /// Kind of the first rendered tile, water if none is rendered.
    pub fn kind(&self) -> LiquidKind {
        kind_of(&self.tiles)
    }

    /// Tile at `(row, col)` of the 8×8 grid.
    pub fn tile(&self, row: usize, col: usize) -> Option<&LiquidTileFlags> {
        if row >= LIQUID_GRID_SIDE || col >= LIQUID_GRID_SIDE {
            return None;
        }
        self.tiles.get(row * LIQUID_GRID_SIDE + col)
    }
}

fn kind_of(tiles: &[LiquidTileFlags]) -> LiquidKind {
    tiles
        .iter()
        .find(|tile| !tile.dont_render)
        .map(|tile| LiquidKind::from_legacy_type(tile.liquid_type))
        .unwrap_or_default()
}

/// Decodes a record from a region of exactly [`LEGACY_LIQUID_SIZE`] bytes.
pub(crate) fn decode_legacy(record: Region<'_>) -> Result<LegacyLiquid, DecodeError> {
    let mut cursor = record.cursor();
    let min_height = cursor.f32()?;
    let max_height = cursor.f32()?;

    // Payload meaning depends on the tile grid, which follows the vertices.
    let mut raw = [([0u8; 4], 0f32); LIQUID_VERTEX_COUNT];
    for (payload, height) in raw.iter_mut() {
        payload.copy_from_slice(cursor.take(4)?);
        *height = cursor.f32()?;
    }

    let mut tiles = [LiquidTileFlags::default(); TILE_COUNT];
    for tile in tiles.iter_mut() {
        *tile = LiquidTileFlags::unpack(cursor.u8()?);
    }

    let declared_flow_count = cursor.u32()?;
    let mut flows = [FlowVector::default(); FLOW_VECTOR_COUNT];
    for flow in flows.iter_mut() {
        *flow = FlowVector {
            position: cursor.vec3()?,
            radius: cursor.f32()?,
            direction: cursor.vec3()?,
            velocity: cursor.f32()?,
            amplitude: cursor.f32()?,
            frequency: cursor.f32()?,
        };
    }

    let magma_style = kind_of(&tiles).is_magma_style();
    let vertices = raw.map(|(p, height)| LegacyVertex {
        data: if magma_style {
            LegacyVertexData::Magma {
                u: u16::from_le_bytes([p[0], p[1]]),
                v: u16::from_le_bytes([p[2], p[3]]),
            }
        } else {
            LegacyVertexData::Water {
                depth: p[0],
                flow: [p[1], p[2]],
                filler: p[3],
            }
        },
        height,
    });

    Ok(LegacyLiquid {
        min_height,
        max_height,
        vertices,
        tiles,
        declared_flow_count,
        flows,
    })
}

/// Encodes a record. Each vertex is written in its own payload variant.
pub(crate) fn encode_legacy(liquid: &LegacyLiquid) -> Vec<u8> {
    let mut out = BlockBuilder::with_capacity(LEGACY_LIQUID_SIZE);
    out.put_f32(liquid.min_height);
    out.put_f32(liquid.max_height);
    for vertex in &liquid.vertices {
        match vertex.data {
            LegacyVertexData::Water {
                depth,
                flow,
                filler,
            } => out.put_bytes(&[depth, flow[0], flow[1], filler]),
            LegacyVertexData::Magma { u, v } => {
                out.put_u16(u);
                out.put_u16(v);
            }
        }
        out.put_f32(vertex.height);
    }
    for tile in &liquid.tiles {
        out.put_u8(tile.pack());
    }
    out.put_u32(liquid.declared_flow_count);
    for flow in &liquid.flows {
        out.put_vec3(flow.position);
        out.put_f32(flow.radius);
        out.put_vec3(flow.direction);
        out.put_f32(flow.velocity);
        out.put_f32(flow.amplitude);
        out.put_f32(flow.frequency);
    }
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
