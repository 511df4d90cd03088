//! Modern layered liquid and the tile-level liquid block.
//!
//! # Block layout
//!
//! All offsets are relative to the start of the block.
//!
//! | Offset | Size     | Field                                              |
//! |--------|----------|----------------------------------------------------|
//! | 0      | 256 × 12 | per-chunk headers: info offset, layer count, attribute offset |
//! | ...    | n × 24   | information records, one per layer                 |
//! | ...    | var      | render masks and vertex data                       |
//! | ...    | 16       | attributes: fishable `u64`, fatigue `u64`          |
//!
//! Information record:
//!
//! | Offset | Size | Field              |
//! |--------|------|--------------------|
//! | 0      | 2    | liquid type id     |
//! | 2      | 2    | vertex format tag  |
//! | 4      | 4    | min height         |
//! | 8      | 4    | max height         |
//! | 12     | 4    | x, y, width, height of the coverage rectangle (u8 each) |
//! | 16     | 4    | render mask offset (0 = every covered unit rendered) |
//! | 20     | 4    | vertex data offset (0 = flat at min height) |
//!
//! A chunk header with a zero info offset has no modern liquid.

use crate::error::{DecodeError, EncodeError};
use crate::io::{BlockBuilder, Cursor, Region, to_u32};
use crate::tile::CHUNKS_PER_TILE;

/// Side length of the liquid unit grid.
pub const LIQUID_GRID_SIDE: usize = 8;

/// Side length of the liquid vertex grid.
pub const LIQUID_VERTEX_SIDE: usize = LIQUID_GRID_SIDE + 1;

/// Vertices per liquid layer.
pub const LIQUID_VERTEX_COUNT: usize = LIQUID_VERTEX_SIDE * LIQUID_VERTEX_SIDE;

const HEADER_SIZE: usize = 12;
const HEADERS_SIZE: usize = CHUNKS_PER_TILE * HEADER_SIZE;
const INFO_SIZE: usize = 24;

/// Which per-vertex fields a layer stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LiquidVertexFormat {
    /// Height and depth (tag 0).
    #[default]
    HeightDepth,
    /// Height and texture coordinates (tag 1).
    HeightUv,
    /// Height only (tag 2).
    HeightOnly,
    /// Height, texture coordinates and depth (tag 3).
    HeightUvDepth,
}

impl LiquidVertexFormat {
    /// Parses an on-disk tag.
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::HeightDepth),
            1 => Some(Self::HeightUv),
            2 => Some(Self::HeightOnly),
            3 => Some(Self::HeightUvDepth),
            _ => None,
        }
    }

    pub fn tag(self) -> u16 {
        match self {
            Self::HeightDepth => 0,
            Self::HeightUv => 1,
            Self::HeightOnly => 2,
            Self::HeightUvDepth => 3,
        }
    }

    pub fn has_uv(self) -> bool {
        matches!(self, Self::HeightUv | Self::HeightUvDepth)
    }

    pub fn has_depth(self) -> bool {
        matches!(self, Self::HeightDepth | Self::HeightUvDepth)
    }

    fn vertex_size(self) -> usize {
        let uv = if self.has_uv() { 4 } else { 0 };
        let depth = if self.has_depth() { 1 } else { 0 };
        4 + uv + depth
    }
}

/// One vertex of a liquid layer. Fields the layer's format does not store
/// stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiquidVertex {
    pub height: f32,
    pub depth: u8,
    pub uv: [u16; 2],
}

impl LiquidVertex {
    fn flat(height: f32) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }
}

/// Coverage rectangle over the 8×8 unit grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LiquidRect {
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
}

impl LiquidRect {
    /// The whole unit grid.
    pub const FULL: Self = Self {
        x: 0,
        y: 0,
        width: LIQUID_GRID_SIDE as u8,
        height: LIQUID_GRID_SIDE as u8,
    };

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn fits_grid(&self) -> bool {
        usize::from(self.x) + usize::from(self.width) <= LIQUID_GRID_SIDE
            && usize::from(self.y) + usize::from(self.height) <= LIQUID_GRID_SIDE
    }

    fn mask_len(&self) -> usize {
        (usize::from(self.width) * usize::from(self.height)).div_ceil(8)
    }

    /// Covered units as `(row, col)`, row-major.
    fn units(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (x, y) = (usize::from(self.x), usize::from(self.y));
        let (w, h) = (usize::from(self.width), usize::from(self.height));
        (y..y + h).flat_map(move |row| (x..x + w).map(move |col| (row, col)))
    }

    /// Indices into the 9×9 vertex grid of the covered vertices, row-major.
    fn vertex_slots(&self) -> impl Iterator<Item = usize> + use<> {
        let (x, y) = (usize::from(self.x), usize::from(self.y));
        let (w, h) = (usize::from(self.width), usize::from(self.height));
        (y..=y + h).flat_map(move |row| (x..=x + w).map(move |col| row * LIQUID_VERTEX_SIDE + col))
    }

    fn vertex_count(&self) -> usize {
        (usize::from(self.width) + 1) * (usize::from(self.height) + 1)
    }
}

fn unit_bit(row: usize, col: usize) -> u64 {
    1u64 << (row * LIQUID_GRID_SIDE + col)
}

/// One layer of modern liquid.
///
/// The layer always holds the full 9×9 vertex grid and a render bit per unit;
/// the stored coverage rectangle is derived from the render bits on encode.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidLayer {
    /// Liquid type id.
    pub liquid_id: u16,
    /// Per-vertex fields written for this layer.
    pub vertex_format: LiquidVertexFormat,
    pub min_height: f32,
    pub max_height: f32,
    /// Rendered units, bit `row * 8 + col`.
    pub render: u64,
    /// 81 vertices, row-major.
    pub vertices: Vec<LiquidVertex>,
}

impl LiquidLayer {
    /// Creates a layer covering every unit, flat at `min_height`.
    pub fn new(liquid_id: u16, min_height: f32, max_height: f32) -> Self {
        Self {
            liquid_id,
            vertex_format: LiquidVertexFormat::default(),
            min_height,
            max_height,
            render: u64::MAX,
            vertices: vec![LiquidVertex::flat(min_height); LIQUID_VERTEX_COUNT],
        }
    }

    /// Smallest rectangle containing every rendered unit.
    pub fn coverage(&self) -> LiquidRect {
        // (first row, last row, first col, last col)
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (row, col) in LiquidRect::FULL.units() {
            if !self.is_rendered(row, col) {
                continue;
            }
            bounds = Some(match bounds {
                None => (row, row, col, col),
                Some((r0, r1, c0, c1)) => (r0.min(row), r1.max(row), c0.min(col), c1.max(col)),
            });
        }
        let Some((r0, r1, c0, c1)) = bounds else {
            return LiquidRect::default();
        };
        LiquidRect {
            x: c0 as u8,
            y: r0 as u8,
            width: (c1 - c0 + 1) as u8,
            height: (r1 - r0 + 1) as u8,
        }
    }

    /// Returns whether unit `(row, col)` is rendered. Out-of-range units are not.
    pub fn is_rendered(&self, row: usize, col: usize) -> bool {
        row < LIQUID_GRID_SIDE && col < LIQUID_GRID_SIDE && self.render & unit_bit(row, col) != 0
    }

    /// Shows or hides unit `(row, col)`.
    pub fn set_rendered(&mut self, row: usize, col: usize, on: bool) {
        if row >= LIQUID_GRID_SIDE || col >= LIQUID_GRID_SIDE {
            tracing::warn!(
                "LiquidLayer::set_rendered out of bounds: ({}, {})",
                row,
                col
            );
            return;
        }
        if on {
            self.render |= unit_bit(row, col);
        } else {
            self.render &= !unit_bit(row, col);
        }
    }

    /// Vertex at `(row, col)` of the 9×9 grid.
    pub fn vertex(&self, row: usize, col: usize) -> Option<&LiquidVertex> {
        if row >= LIQUID_VERTEX_SIDE || col >= LIQUID_VERTEX_SIDE {
            return None;
        }
        self.vertices.get(row * LIQUID_VERTEX_SIDE + col)
    }

    pub fn vertex_mut(&mut self, row: usize, col: usize) -> Option<&mut LiquidVertex> {
        if row >= LIQUID_VERTEX_SIDE || col >= LIQUID_VERTEX_SIDE {
            return None;
        }
        self.vertices.get_mut(row * LIQUID_VERTEX_SIDE + col)
    }
}

/// Modern liquid for one chunk: its layers plus the unit attribute masks.
#[derive(Debug, Clone, PartialEq)]
pub struct ModernLiquid {
    pub layers: Vec<LiquidLayer>,
    /// Fishable units, bit `row * 8 + col`.
    pub fishable: u64,
    /// Units that cause swim fatigue.
    pub fatigue: u64,
}

impl Default for ModernLiquid {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            fishable: u64::MAX,
            fatigue: 0,
        }
    }
}

impl ModernLiquid {
    /// Single-layer liquid with default attributes.
    pub fn with_layer(layer: LiquidLayer) -> Self {
        Self {
            layers: vec![layer],
            ..Self::default()
        }
    }

    fn has_default_attributes(&self) -> bool {
        self.fishable == u64::MAX && self.fatigue == 0
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decodes the tile-level block into one optional entry per chunk slot.
pub(crate) fn decode_modern_block(
    block: Region<'_>,
) -> Result<Vec<Option<ModernLiquid>>, DecodeError> {
    let mut headers = block.sub(0, HEADERS_SIZE, "liquid headers")?.cursor();
    let mut chunks = Vec::with_capacity(CHUNKS_PER_TILE);
    for _ in 0..CHUNKS_PER_TILE {
        let ofs_info = headers.usize32()?;
        let n_layers = headers.usize32()?;
        let ofs_attributes = headers.usize32()?;
        if ofs_info == 0 {
            chunks.push(None);
            continue;
        }

        let infos = block.sub(ofs_info, n_layers.saturating_mul(INFO_SIZE), "liquid info")?;
        let mut cursor = infos.cursor();
        let layers = (0..n_layers)
            .map(|_| decode_layer(block, &mut cursor))
            .collect::<Result<Vec<_>, _>>()?;

        let mut liquid = ModernLiquid {
            layers,
            ..ModernLiquid::default()
        };
        if ofs_attributes != 0 {
            let mut attributes = block.sub(ofs_attributes, 16, "liquid attributes")?.cursor();
            liquid.fishable = attributes.u64()?;
            liquid.fatigue = attributes.u64()?;
        }
        chunks.push(Some(liquid));
    }
    Ok(chunks)
}

fn decode_layer(block: Region<'_>, info: &mut Cursor<'_>) -> Result<LiquidLayer, DecodeError> {
    let record = info.position();
    let liquid_id = info.u16()?;
    let tag_offset = info.position();
    let tag = info.u16()?;
    let vertex_format = LiquidVertexFormat::from_tag(tag).ok_or(DecodeError::UnknownFormatTag {
        offset: tag_offset,
        tag,
    })?;
    let min_height = info.f32()?;
    let max_height = info.f32()?;
    let rect = LiquidRect {
        x: info.u8()?,
        y: info.u8()?,
        width: info.u8()?,
        height: info.u8()?,
    };
    let ofs_mask = info.usize32()?;
    let ofs_vertices = info.usize32()?;

    if !rect.fits_grid() {
        return Err(DecodeError::InvalidCoverage { offset: record });
    }

    let mut layer = LiquidLayer {
        liquid_id,
        vertex_format,
        min_height,
        max_height,
        render: 0,
        vertices: vec![LiquidVertex::flat(min_height); LIQUID_VERTEX_COUNT],
    };
    if rect.is_empty() {
        return Ok(layer);
    }

    let mask = match ofs_mask {
        0 => None,
        ofs => Some(block.sub(ofs, rect.mask_len(), "liquid render mask")?.bytes()),
    };
    for (i, (row, col)) in rect.units().enumerate() {
        if mask.is_none_or(|m| m[i / 8] & (1 << (i % 8)) != 0) {
            layer.render |= unit_bit(row, col);
        }
    }

    if ofs_vertices != 0 {
        let size = rect.vertex_count() * vertex_format.vertex_size();
        let mut data = block.sub(ofs_vertices, size, "liquid vertices")?.cursor();
        for slot in rect.vertex_slots() {
            layer.vertices[slot].height = data.f32()?;
        }
        if vertex_format.has_uv() {
            for slot in rect.vertex_slots() {
                layer.vertices[slot].uv = [data.u16()?, data.u16()?];
            }
        }
        if vertex_format.has_depth() {
            for slot in rect.vertex_slots() {
                layer.vertices[slot].depth = data.u8()?;
            }
        }
    }

    // Encode stores only the vertices of the rendered units' bounding box.
    let rendered = layer.coverage();
    let mut kept = [false; LIQUID_VERTEX_COUNT];
    if !rendered.is_empty() {
        for slot in rendered.vertex_slots() {
            kept[slot] = true;
        }
    }
    for (vertex, kept) in layer.vertices.iter_mut().zip(kept) {
        if !kept {
            *vertex = LiquidVertex::flat(min_height);
        }
    }
    Ok(layer)
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encodes the tile-level block. `chunks` holds one entry per chunk slot and
/// every layer must carry a full vertex grid.
pub(crate) fn encode_modern_block(
    chunks: &[Option<&ModernLiquid>],
) -> Result<Vec<u8>, EncodeError> {
    let mut headers = BlockBuilder::with_capacity(HEADERS_SIZE);
    let mut body = BlockBuilder::new();

    for liquid in chunks {
        let Some(liquid) = liquid else {
            headers.put_u32(0);
            headers.put_u32(0);
            headers.put_u32(0);
            continue;
        };

        let ofs_info = HEADERS_SIZE + body.position();
        let data_start = ofs_info + liquid.layers.len() * INFO_SIZE;
        let mut infos = BlockBuilder::with_capacity(liquid.layers.len() * INFO_SIZE);
        let mut data = BlockBuilder::new();

        for layer in &liquid.layers {
            let rect = layer.coverage();
            let (ofs_mask, ofs_vertices) = if rect.is_empty() {
                (0, 0)
            } else {
                let mask = data.append_block(&encode_render_mask(layer, rect));
                let vertices = data.append_block(&encode_vertices(layer, rect));
                (
                    mask.offset_u32(data_start, false, "liquid block")?,
                    vertices.offset_u32(data_start, false, "liquid block")?,
                )
            };

            infos.put_u16(layer.liquid_id);
            infos.put_u16(layer.vertex_format.tag());
            infos.put_f32(layer.min_height);
            infos.put_f32(layer.max_height);
            infos.put_u8(rect.x);
            infos.put_u8(rect.y);
            infos.put_u8(rect.width);
            infos.put_u8(rect.height);
            infos.put_u32(ofs_mask);
            infos.put_u32(ofs_vertices);
        }

        body.put_bytes(&infos.into_inner());
        body.put_bytes(&data.into_inner());

        let ofs_attributes = if liquid.has_default_attributes() {
            0
        } else {
            let offset = to_u32(HEADERS_SIZE + body.position(), "liquid block")?;
            body.put_u64(liquid.fishable);
            body.put_u64(liquid.fatigue);
            offset
        };

        headers.put_u32(to_u32(ofs_info, "liquid block")?);
        headers.put_u32(to_u32(liquid.layers.len(), "liquid layers")?);
        headers.put_u32(ofs_attributes);
    }

    let mut block = headers.into_inner();
    block.extend_from_slice(&body.into_inner());
    Ok(block)
}

fn encode_render_mask(layer: &LiquidLayer, rect: LiquidRect) -> Vec<u8> {
    let mut mask = vec![0u8; rect.mask_len()];
    for (i, (row, col)) in rect.units().enumerate() {
        if layer.is_rendered(row, col) {
            mask[i / 8] |= 1 << (i % 8);
        }
    }
    mask
}

fn encode_vertices(layer: &LiquidLayer, rect: LiquidRect) -> Vec<u8> {
    let format = layer.vertex_format;
    let mut out = BlockBuilder::with_capacity(rect.vertex_count() * format.vertex_size());
    for slot in rect.vertex_slots() {
        out.put_f32(layer.vertices[slot].height);
    }
    if format.has_uv() {
        for slot in rect.vertex_slots() {
            let [u, v] = layer.vertices[slot].uv;
            out.put_u16(u);
            out.put_u16(v);
        }
    }
    if format.has_depth() {
        for slot in rect.vertex_slots() {
            out.put_u8(layer.vertices[slot].depth);
        }
    }
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
