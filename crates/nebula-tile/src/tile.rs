//! Tile container: header, chunk index and the tile-level tables.
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic bytes `"NTIL"` |
//! | 4 | 4 | Container version (`u32`, currently 18) |
//! | 8 | 4 | Tile flags |
//! | 12 | 4 | Chunk index offset |
//! | 16 | 8 | Texture name blob offset / size |
//! | 24 | 8 | Model name blob offset / size |
//! | 32 | 8 | Model name id table offset / count |
//! | 40 | 8 | Object name blob offset / size |
//! | 48 | 8 | Object name id table offset / count |
//! | 56 | 8 | Doodad placements offset / count |
//! | 64 | 8 | Object placements offset / count |
//! | 72 | 8 | Modern liquid block offset / size (0 = absent) |
//! | 80 | 8 | Texture flag table offset / count (0 = absent) |
//! | 88 | 4 | Flight bounds offset (0 = absent) |
//! | 92 | 4 | Header flags (`0x1` = flight bounds present) |
//! | 96 | 4096 | Chunk index: 256 × (offset, size, flags, async id) |
//!
//! Tile-level offsets are absolute. The encoder writes the tables in the order
//! above, followed by the chunk payloads in slot order. Unknown header flag
//! bits are dropped.

use std::borrow::Cow;

use crate::alpha::AlphaFormat;
use crate::bounds::{FLIGHT_BOUNDS_SIZE, FlightBounds, decode_flight_bounds, encode_flight_bounds};
use crate::chunk::{
    CHUNK_HEADER_SIZE, Chunk, ChunkContext, ChunkPlan, decode_chunk, encode_chunk, validate_chunk,
};
use crate::config::EncodeConfig;
use crate::error::{DecodeError, EncodeError, TILE_LEVEL, TableKind};
use crate::flags::{TextureFlags, TileFlags};
use crate::io::{BlockBuilder, BlockRange, Cursor, Region, to_u32};
use crate::liquid::{
    LiquidBlock, LiquidFormat, ModernLiquid, decode_modern_block, encode_modern_block,
    legacy_to_modern, modern_to_legacy, set_legacy_flags,
};
use crate::names::{
    NameResolver, NameTables, decode_id_table, decode_name_blob, encode_id_table,
    encode_name_blob,
};
use crate::placement::{
    DOODAD_PLACEMENT_SIZE, DoodadPlacement, OBJECT_PLACEMENT_SIZE, ObjectPlacement,
    decode_doodads, decode_objects, encode_doodads, encode_objects,
};

/// Magic bytes identifying a tile.
pub const TILE_MAGIC: [u8; 4] = *b"NTIL";

/// Container version this codec reads and writes.
pub const TILE_VERSION: u32 = 18;

/// Size of the tile header in bytes.
pub const TILE_HEADER_SIZE: usize = 96;

/// Chunks along one side of a tile.
pub const CHUNKS_PER_SIDE: usize = 16;

/// Chunks per tile.
pub const CHUNKS_PER_TILE: usize = CHUNKS_PER_SIDE * CHUNKS_PER_SIDE;

const INDEX_ENTRY_SIZE: usize = 16;
const HEADER_FLIGHT_BOUNDS: u32 = 0x1;
const INDEX_SIZE: usize = CHUNKS_PER_TILE * INDEX_ENTRY_SIZE;

/// A decoded map tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub flags: TileFlags,
    pub names: NameTables,
    /// One entry per texture name, when the tile carries the table.
    pub texture_flags: Option<Vec<TextureFlags>>,
    pub doodads: Vec<DoodadPlacement>,
    pub objects: Vec<ObjectPlacement>,
    pub flight_bounds: Option<FlightBounds>,
    /// 256 chunks, index `row * 16 + col`.
    pub chunks: Vec<Chunk>,
}

impl Default for Tile {
    fn default() -> Self {
        Self::new()
    }
}

impl Tile {
    /// An empty tile of flat chunks.
    pub fn new() -> Self {
        Self {
            flags: TileFlags::default(),
            names: NameTables::default(),
            texture_flags: None,
            doodads: Vec::new(),
            objects: Vec::new(),
            flight_bounds: None,
            chunks: vec![Chunk::new(glam::Vec3::ZERO); CHUNKS_PER_TILE],
        }
    }

    /// Chunk at grid `(row, col)`.
    pub fn chunk(&self, row: usize, col: usize) -> Option<&Chunk> {
        if row >= CHUNKS_PER_SIDE || col >= CHUNKS_PER_SIDE {
            return None;
        }
        self.chunks.get(row * CHUNKS_PER_SIDE + col)
    }

    pub fn chunk_mut(&mut self, row: usize, col: usize) -> Option<&mut Chunk> {
        if row >= CHUNKS_PER_SIDE || col >= CHUNKS_PER_SIDE {
            return None;
        }
        self.chunks.get_mut(row * CHUNKS_PER_SIDE + col)
    }
}

#[derive(Debug, Default)]
struct TileHeader {
    flags: u32,
    ofs_index: usize,
    ofs_textures: usize,
    size_textures: usize,
    ofs_models: usize,
    size_models: usize,
    ofs_model_ids: usize,
    n_model_ids: usize,
    ofs_objects: usize,
    size_objects: usize,
    ofs_object_ids: usize,
    n_object_ids: usize,
    ofs_doodads: usize,
    n_doodads: usize,
    ofs_placements: usize,
    n_placements: usize,
    ofs_liquid: usize,
    size_liquid: usize,
    ofs_texture_flags: usize,
    n_texture_flags: usize,
    ofs_flight_bounds: usize,
    header_flags: u32,
}

impl TileHeader {
    /// Reads the fields following magic and version.
    fn read(c: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            flags: c.u32()?,
            ofs_index: c.usize32()?,
            ofs_textures: c.usize32()?,
            size_textures: c.usize32()?,
            ofs_models: c.usize32()?,
            size_models: c.usize32()?,
            ofs_model_ids: c.usize32()?,
            n_model_ids: c.usize32()?,
            ofs_objects: c.usize32()?,
            size_objects: c.usize32()?,
            ofs_object_ids: c.usize32()?,
            n_object_ids: c.usize32()?,
            ofs_doodads: c.usize32()?,
            n_doodads: c.usize32()?,
            ofs_placements: c.usize32()?,
            n_placements: c.usize32()?,
            ofs_liquid: c.usize32()?,
            size_liquid: c.usize32()?,
            ofs_texture_flags: c.usize32()?,
            n_texture_flags: c.usize32()?,
            ofs_flight_bounds: c.usize32()?,
            header_flags: c.u32()?,
        })
    }

    fn write(&self, out: &mut BlockBuilder) -> Result<(), EncodeError> {
        out.put_bytes(&TILE_MAGIC);
        out.put_u32(TILE_VERSION);
        out.put_u32(self.flags);
        for field in [
            self.ofs_index,
            self.ofs_textures,
            self.size_textures,
            self.ofs_models,
            self.size_models,
            self.ofs_model_ids,
            self.n_model_ids,
            self.ofs_objects,
            self.size_objects,
            self.ofs_object_ids,
            self.n_object_ids,
            self.ofs_doodads,
            self.n_doodads,
            self.ofs_placements,
            self.n_placements,
            self.ofs_liquid,
            self.size_liquid,
            self.ofs_texture_flags,
            self.n_texture_flags,
            self.ofs_flight_bounds,
        ] {
            out.put_u32(to_u32(field, "tile header field")?);
        }
        out.put_u32(self.header_flags);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decodes a complete tile. Any error aborts the whole decode.
pub fn decode_tile(bytes: &[u8]) -> Result<Tile, DecodeError> {
    let buffer = Region::new(bytes);
    let mut c = buffer.cursor();
    if c.take(4)? != TILE_MAGIC {
        return Err(DecodeError::InvalidMagic);
    }
    let version = c.u32()?;
    if version != TILE_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    let h = TileHeader::read(&mut c)?;
    let flags = TileFlags::unpack(h.flags);

    let names = NameTables {
        textures: decode_name_blob(buffer.sub(h.ofs_textures, h.size_textures, "texture names")?),
        models: decode_id_table(
            buffer.sub(h.ofs_models, h.size_models, "model names")?,
            buffer.sub(h.ofs_model_ids, h.n_model_ids.saturating_mul(4), "model name ids")?,
            h.n_model_ids,
        )?,
        objects: decode_id_table(
            buffer.sub(h.ofs_objects, h.size_objects, "object names")?,
            buffer.sub(h.ofs_object_ids, h.n_object_ids.saturating_mul(4), "object name ids")?,
            h.n_object_ids,
        )?,
    };

    let texture_flags = if h.n_texture_flags == 0 {
        None
    } else {
        let mut c = buffer
            .sub(h.ofs_texture_flags, h.n_texture_flags.saturating_mul(4), "texture flags")?
            .cursor();
        let entries = (0..h.n_texture_flags)
            .map(|_| Ok(TextureFlags::unpack(c.u32()?)))
            .collect::<Result<Vec<_>, DecodeError>>()?;
        Some(entries)
    };

    let doodads = decode_doodads(
        buffer.sub(
            h.ofs_doodads,
            h.n_doodads.saturating_mul(DOODAD_PLACEMENT_SIZE),
            "doodad placements",
        )?,
        h.n_doodads,
        names.model_count(),
    )?;
    let objects = decode_objects(
        buffer.sub(
            h.ofs_placements,
            h.n_placements.saturating_mul(OBJECT_PLACEMENT_SIZE),
            "object placements",
        )?,
        h.n_placements,
        names.object_count(),
    )?;

    let flight_bounds = if h.header_flags & HEADER_FLIGHT_BOUNDS == 0 {
        None
    } else if h.ofs_flight_bounds == 0 {
        return Err(DecodeError::InvalidOffset {
            offset: 0,
            what: "flight bounds",
        });
    } else {
        Some(decode_flight_bounds(buffer.sub(
            h.ofs_flight_bounds,
            FLIGHT_BOUNDS_SIZE,
            "flight bounds",
        )?)?)
    };

    let modern = if h.ofs_liquid == 0 {
        vec![None; CHUNKS_PER_TILE]
    } else {
        decode_modern_block(buffer.sub(h.ofs_liquid, h.size_liquid, "liquid block")?)?
    };

    let ctx = ChunkContext {
        alpha_format: AlphaFormat::from_big_alpha(flags.big_alpha),
        names: &names,
        doodads: doodads.len(),
        objects: objects.len(),
    };
    let mut index = buffer.sub(h.ofs_index, INDEX_SIZE, "chunk index")?.cursor();
    let mut chunks = Vec::with_capacity(CHUNKS_PER_TILE);
    for (slot, modern) in modern.into_iter().enumerate() {
        let offset = index.usize32()?;
        let size = index.usize32()?;
        let index_flags = index.u32()?;
        let async_id = index.u32()?;
        let region = buffer.sub(offset, size, "chunk")?;
        if size < CHUNK_HEADER_SIZE {
            return Err(DecodeError::TruncatedBuffer {
                offset,
                needed: CHUNK_HEADER_SIZE,
                available: size,
            });
        }
        let mut chunk = decode_chunk(region, slot, &ctx, modern)?;
        chunk.index_flags = index_flags;
        chunk.async_id = async_id;
        chunks.push(chunk);
    }

    tracing::debug!(
        "Decoded tile: {} bytes, {} textures, {} doodads, {} objects, {} chunks with liquid",
        bytes.len(),
        names.textures.len(),
        doodads.len(),
        objects.len(),
        chunks.iter().filter(|c| c.liquid.is_some()).count()
    );

    Ok(Tile {
        flags,
        names,
        texture_flags,
        doodads,
        objects,
        flight_bounds,
        chunks,
    })
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encodes a tile into a new buffer.
pub fn encode_tile(tile: &Tile, config: &EncodeConfig) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode_tile_into(tile, config, &mut out)?;
    Ok(out)
}

/// Encodes a tile and appends it to `out`.
///
/// The tile is validated and fully laid out before anything is appended, so
/// `out` is left untouched on error.
pub fn encode_tile_into(
    tile: &Tile,
    config: &EncodeConfig,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    validate_tile(tile)?;

    let mut payloads = Vec::with_capacity(CHUNKS_PER_TILE);
    let mut modern = Vec::with_capacity(CHUNKS_PER_TILE);
    for (slot, chunk) in tile.chunks.iter().enumerate() {
        let (plan, liquid) = plan_chunk(chunk, slot, config);
        payloads.push(encode_chunk(chunk, slot, &plan, config.alpha_format)?);
        modern.push(liquid);
    }

    let liquid_block = if modern.iter().all(Option::is_none) {
        Vec::new()
    } else {
        let refs: Vec<Option<&ModernLiquid>> = modern.iter().map(|m| m.as_deref()).collect();
        encode_modern_block(&refs)?
    };

    let mut texture_flags = BlockBuilder::new();
    for flags in tile.texture_flags.iter().flatten() {
        texture_flags.put_u32(flags.pack());
    }

    let base = TILE_HEADER_SIZE + INDEX_SIZE;
    let mut body = BlockBuilder::new();
    let textures = body.append_block(&encode_name_blob(&tile.names.textures));
    let models = body.append_block(&encode_name_blob(&tile.names.models));
    let model_ids = body.append_block(&encode_id_table(&tile.names.models)?);
    let objects = body.append_block(&encode_name_blob(&tile.names.objects));
    let object_ids = body.append_block(&encode_id_table(&tile.names.objects)?);
    let doodads = body.append_block(&encode_doodads(&tile.doodads));
    let placements = body.append_block(&encode_objects(&tile.objects));
    let liquid = body.append_block(&liquid_block);
    let texture_flags = body.append_block(&texture_flags.into_inner());
    let flight_bounds = body.append_block(
        &tile.flight_bounds.as_ref().map(encode_flight_bounds).unwrap_or_default(),
    );

    let mut index = BlockBuilder::with_capacity(INDEX_SIZE);
    for (payload, chunk) in payloads.iter().zip(&tile.chunks) {
        let range = body.append_block(payload);
        index.put_u32(range.offset_u32(base, false, "tile")?);
        index.put_u32(to_u32(range.len, "chunk")?);
        index.put_u32(chunk.index_flags);
        index.put_u32(chunk.async_id);
    }

    let at = |range: BlockRange| -> Result<usize, EncodeError> {
        Ok(range.offset_u32(base, true, "tile")? as usize)
    };
    let header = TileHeader {
        flags: TileFlags {
            big_alpha: config.alpha_format == AlphaFormat::Packed4Bit,
            ..tile.flags
        }
        .pack(),
        ofs_index: TILE_HEADER_SIZE,
        ofs_textures: at(textures)?,
        size_textures: textures.len,
        ofs_models: at(models)?,
        size_models: models.len,
        ofs_model_ids: at(model_ids)?,
        n_model_ids: tile.names.models.len(),
        ofs_objects: at(objects)?,
        size_objects: objects.len,
        ofs_object_ids: at(object_ids)?,
        n_object_ids: tile.names.objects.len(),
        ofs_doodads: at(doodads)?,
        n_doodads: tile.doodads.len(),
        ofs_placements: at(placements)?,
        n_placements: tile.objects.len(),
        ofs_liquid: at(liquid)?,
        size_liquid: liquid.len,
        ofs_texture_flags: at(texture_flags)?,
        n_texture_flags: tile.texture_flags.as_ref().map_or(0, Vec::len),
        ofs_flight_bounds: at(flight_bounds)?,
        header_flags: if tile.flight_bounds.is_some() { HEADER_FLIGHT_BOUNDS } else { 0 },
    };

    let mut head = BlockBuilder::with_capacity(base);
    header.write(&mut head)?;
    head.put_bytes(&index.into_inner());
    let head = head.into_inner();
    let body = body.into_inner();

    tracing::debug!(
        "Encoded tile: {} bytes, alpha {:?}, holes {:?}, liquid {:?}",
        head.len() + body.len(),
        config.alpha_format,
        config.hole_resolution,
        config.liquid_format
    );

    out.reserve(head.len() + body.len());
    out.extend_from_slice(&head);
    out.extend_from_slice(&body);
    Ok(())
}

fn validate_tile(tile: &Tile) -> Result<(), EncodeError> {
    if tile.chunks.len() != CHUNKS_PER_TILE {
        return Err(EncodeError::ChunkCount(tile.chunks.len()));
    }
    if let Some(flags) = &tile.texture_flags
        && flags.len() != tile.names.textures.len()
    {
        return Err(EncodeError::BlockSize {
            chunk: TILE_LEVEL,
            block: "texture flags",
            expected: tile.names.textures.len(),
            actual: flags.len(),
        });
    }
    tile.names.check_names()?;

    let names = tile
        .doodads
        .iter()
        .map(|d| (TableKind::Models, d.name_id, tile.names.model_count()))
        .chain(
            tile.objects
                .iter()
                .map(|o| (TableKind::Objects, o.name_id, tile.names.object_count())),
        );
    for (table, index, len) in names {
        if index as usize >= len {
            return Err(EncodeError::IndexOutOfRange {
                chunk: TILE_LEVEL,
                table,
                index,
                len,
            });
        }
    }

    for (slot, chunk) in tile.chunks.iter().enumerate() {
        validate_chunk(chunk, slot, &tile.names, tile.doodads.len(), tile.objects.len())?;
    }
    Ok(())
}

/// Applies the encode policy to one chunk: hole resolution and liquid
/// generation. Returns the chunk plan and the chunk's modern liquid, if any.
fn plan_chunk<'a>(
    chunk: &'a Chunk,
    slot: usize,
    config: &EncodeConfig,
) -> (ChunkPlan<'a>, Option<Cow<'a, ModernLiquid>>) {
    let mut flags = chunk.flags;
    let (legacy, modern) = match (&chunk.liquid, config.liquid_format) {
        (None, _) => (None, None),
        (Some(LiquidBlock::Modern(m)), LiquidFormat::Legacy) => {
            let legacy = modern_to_legacy(m, slot);
            match &legacy {
                Some(l) => set_legacy_flags(&mut flags, l.kind()),
                None => flags.clear_legacy_liquid(),
            }
            (legacy.map(Cow::Owned), None)
        }
        (Some(LiquidBlock::Modern(m)), _) => (None, Some(Cow::Borrowed(m))),
        (Some(LiquidBlock::Legacy(l)), LiquidFormat::Modern) => {
            flags.clear_legacy_liquid();
            (None, Some(Cow::Owned(legacy_to_modern(l))))
        }
        (Some(LiquidBlock::Legacy(l)), _) => (Some(Cow::Borrowed(l)), None),
    };
    let plan = ChunkPlan {
        flags,
        holes: config.hole_resolution.apply(chunk.holes),
        legacy,
    };
    (plan, modern)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_empty_tile_roundtrip() {
        let tile = Tile::new();
        let bytes = encode_tile(&tile, &EncodeConfig::default()).unwrap();
        assert_eq!(&bytes[0..4], b"NTIL");
        assert_eq!(&bytes[4..8], &18u32.to_le_bytes());

        let decoded = decode_tile(&bytes).unwrap();
        let expected = Tile {
            flags: TileFlags {
                big_alpha: true,
                ..TileFlags::default()
            },
            ..tile
        };
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_header_offsets_are_absolute() {
        let mut tile = Tile::new();
        tile.names.textures = vec!["a.blp".into()];
        let bytes = encode_tile(&tile, &EncodeConfig::default()).unwrap();
        let u32_at = |o: usize| u32::from_le_bytes(bytes[o..o + 4].try_into().unwrap()) as usize;

        assert_eq!(u32_at(12), TILE_HEADER_SIZE);
        assert_eq!(u32_at(16), TILE_HEADER_SIZE + INDEX_SIZE);
        assert_eq!(u32_at(20), 6);
        // no liquid, no texture flags
        assert_eq!(u32_at(72), 0);
        assert_eq!(u32_at(80), 0);
        // no flight bounds
        assert_eq!(u32_at(88), 0);
        assert_eq!(u32_at(92), 0);
        // first chunk right after the texture names
        assert_eq!(u32_at(TILE_HEADER_SIZE), TILE_HEADER_SIZE + INDEX_SIZE + 6);
    }

    #[test]
    fn test_flight_bounds_roundtrip() {
        let mut tile = Tile::new();
        let mut bounds = FlightBounds::flat(1200, -300);
        bounds.max[1][2] = 1500;
        bounds.min[0][0] = -450;
        tile.flight_bounds = Some(bounds);
        let bytes = encode_tile(&tile, &EncodeConfig::default()).unwrap();
        let u32_at = |o: usize| u32::from_le_bytes(bytes[o..o + 4].try_into().unwrap()) as usize;

        assert_eq!(u32_at(92), 1);
        let ofs = u32_at(88);
        assert_eq!(ofs, TILE_HEADER_SIZE + INDEX_SIZE);
        assert_eq!(&bytes[ofs..ofs + 2], &1200i16.to_le_bytes());

        let decoded = decode_tile(&bytes).unwrap();
        assert_eq!(decoded.flight_bounds, Some(bounds));
        let again = encode_tile(&decoded, &EncodeConfig::default()).unwrap();
        assert_eq!(again, bytes);
    }

    #[test]
    fn test_flight_bounds_flag_without_offset() {
        let mut bytes = encode_tile(&Tile::new(), &EncodeConfig::default()).unwrap();
        bytes[92..96].copy_from_slice(&1u32.to_le_bytes());
        assert_eq!(
            decode_tile(&bytes),
            Err(DecodeError::InvalidOffset {
                offset: 0,
                what: "flight bounds",
            })
        );
        // the offset alone does not enable the block
        let mut bytes = encode_tile(&Tile::new(), &EncodeConfig::default()).unwrap();
        bytes[88..92].copy_from_slice(&(TILE_HEADER_SIZE as u32).to_le_bytes());
        assert_eq!(decode_tile(&bytes).unwrap().flight_bounds, None);
    }

    #[test]
    fn test_chunk_accessors() {
        let mut tile = Tile::new();
        tile.chunk_mut(3, 5).unwrap().area_id = 77;
        assert_eq!(tile.chunks[3 * 16 + 5].area_id, 77);
        assert_eq!(tile.chunk(3, 5).map(|c| c.area_id), Some(77));
        assert!(tile.chunk(16, 0).is_none());
        assert!(tile.chunk_mut(0, 16).is_none());
    }

    #[test]
    fn test_invalid_magic_and_version() {
        let bytes = encode_tile(&Tile::new(), &EncodeConfig::default()).unwrap();

        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert_eq!(decode_tile(&bad), Err(DecodeError::InvalidMagic));

        let mut bad = bytes;
        bad[4..8].copy_from_slice(&17u32.to_le_bytes());
        assert_eq!(decode_tile(&bad), Err(DecodeError::UnsupportedVersion(17)));

        assert!(matches!(
            decode_tile(b"NT"),
            Err(DecodeError::TruncatedBuffer { offset: 0, .. })
        ));
    }

    #[test]
    fn test_chunk_count_rejected() {
        let mut tile = Tile::new();
        tile.chunks.pop();
        assert_eq!(
            encode_tile(&tile, &EncodeConfig::default()),
            Err(EncodeError::ChunkCount(255))
        );
    }

    #[test]
    fn test_placement_name_validated_on_encode() {
        let mut tile = Tile::new();
        tile.doodads.push(DoodadPlacement::new(0, 1, Vec3::ZERO));
        assert_eq!(
            encode_tile(&tile, &EncodeConfig::default()),
            Err(EncodeError::IndexOutOfRange {
                chunk: TILE_LEVEL,
                table: TableKind::Models,
                index: 0,
                len: 0,
            })
        );
    }

    #[test]
    fn test_name_with_nul_rejected_on_encode() {
        let mut tile = Tile::new();
        tile.names.objects = vec!["world/wmo/keep.wmo".into(), "world/wmo/\0tower.wmo".into()];
        let mut out = vec![7u8];
        assert_eq!(
            encode_tile_into(&tile, &EncodeConfig::default(), &mut out),
            Err(EncodeError::InvalidName {
                table: TableKind::Objects,
                index: 1,
            })
        );
        assert_eq!(out, vec![7u8]);
    }

    #[test]
    fn test_texture_flag_count_validated() {
        let mut tile = Tile::new();
        tile.names.textures = vec!["a.blp".into(), "b.blp".into()];
        tile.texture_flags = Some(vec![TextureFlags::default()]);
        assert!(matches!(
            encode_tile(&tile, &EncodeConfig::default()),
            Err(EncodeError::BlockSize {
                block: "texture flags",
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_chunk_smaller_than_header() {
        let mut bytes = encode_tile(&Tile::new(), &EncodeConfig::default()).unwrap();
        let entry = TILE_HEADER_SIZE + 2 * INDEX_ENTRY_SIZE;
        let offset = u32::from_le_bytes(bytes[entry..entry + 4].try_into().unwrap()) as usize;
        bytes[entry + 4..entry + 8].copy_from_slice(&64u32.to_le_bytes());
        assert_eq!(
            decode_tile(&bytes),
            Err(DecodeError::TruncatedBuffer {
                offset,
                needed: CHUNK_HEADER_SIZE,
                available: 64,
            })
        );
    }

    #[test]
    fn test_chunk_index_out_of_bounds() {
        let mut bytes = encode_tile(&Tile::new(), &EncodeConfig::default()).unwrap();
        let entry = TILE_HEADER_SIZE + 5 * INDEX_ENTRY_SIZE;
        bytes[entry..entry + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(
            decode_tile(&bytes),
            Err(DecodeError::InvalidOffset {
                offset: u32::MAX as usize,
                what: "chunk"
            })
        );
    }
}
