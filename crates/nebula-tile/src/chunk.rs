//! One terrain chunk: its 128-byte header and the sub-blocks it points to.
//!
//! ## Header Layout
//!
//! All `ofs_*` fields are relative to the start of the chunk payload.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00 | 4 | Chunk flags |
//! | 0x04 | 8 | Grid column, grid row |
//! | 0x0C | 4 | Layer count |
//! | 0x10 | 4 | Doodad reference count |
//! | 0x14 | 16 | Height, normal, layer table, reference offsets |
//! | 0x24 | 8 | Alpha block offset / size |
//! | 0x2C | 8 | Shadow block offset / size |
//! | 0x34 | 4 | Area id |
//! | 0x38 | 4 | Object reference count |
//! | 0x3C | 4 | Low-resolution hole mask (low 16 bits) |
//! | 0x40 | 16 | Doodad effect mapping (`u16` × 8) |
//! | 0x50 | 8 | Doodad effect stencil (`u8` × 8) |
//! | 0x58 | 8 | Sound emitter offset / count |
//! | 0x60 | 8 | Legacy liquid offset / size |
//! | 0x68 | 12 | Position, stored z, x, y |
//! | 0x74 | 4 | Vertex color offset |
//! | 0x78 | 8 | High-resolution hole mask |
//!
//! Sub-blocks are written after the header in the order heights, normals,
//! layer table, references, alpha, shadow, legacy liquid, sound emitters,
//! vertex colors. Absent optional blocks have offset 0.

use std::borrow::Cow;

use glam::Vec3;

use crate::alpha::AlphaFormat;
use crate::error::{DecodeError, EncodeError, TableKind};
use crate::flags::ChunkFlags;
use crate::holes::HoleMask;
use crate::io::{BlockBuilder, BlockRange, Cursor, Region, to_u32};
use crate::layer::{TextureLayer, check_layers, decode_layers, encode_layers};
use crate::liquid::{
    LEGACY_LIQUID_SIZE, LIQUID_VERTEX_COUNT, LegacyLiquid, LiquidBlock, ModernLiquid,
    decode_legacy, encode_legacy,
};
use crate::names::NameResolver;
use crate::tile::CHUNKS_PER_SIDE;

/// Size of the chunk header in bytes.
pub const CHUNK_HEADER_SIZE: usize = 128;

/// Vertices per chunk: 9×9 outer plus 8×8 inner.
pub const VERTEX_COUNT: usize = 145;

const NORMAL_BLOCK_SIZE: usize = 448;
const SOUND_EMITTER_SIZE: usize = 28;

/// Positional sound source inside a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoundEmitter {
    pub sound_id: u32,
    pub position: Vec3,
    pub size: Vec3,
}

/// A decoded terrain chunk.
///
/// `heights`, `normals` and `vertex_colors` hold [`VERTEX_COUNT`] entries.
/// The encoder recomputes the presence flags (`has_shadow`,
/// `has_vertex_colors`, `high_res_holes`) from the chunk's contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub flags: ChunkFlags,
    pub area_id: u32,
    /// World position of the chunk corner.
    pub position: Vec3,
    pub heights: Vec<f32>,
    pub normals: Vec<[i8; 3]>,
    /// Base layer first, then up to three blend layers.
    pub layers: Vec<TextureLayer>,
    /// Opaque baked shadow data.
    pub shadow: Option<Vec<u8>>,
    /// RGBA per vertex.
    pub vertex_colors: Option<Vec<[u8; 4]>>,
    pub holes: HoleMask,
    pub liquid: Option<LiquidBlock>,
    pub sound_emitters: Vec<SoundEmitter>,
    /// Indices into the tile's doodad placements.
    pub doodad_refs: Vec<u32>,
    /// Indices into the tile's object placements.
    pub object_refs: Vec<u32>,
    pub doodad_mapping: [u16; 8],
    pub doodad_stencil: [u8; 8],
    /// Flags word from the tile's chunk index entry.
    pub index_flags: u32,
    pub async_id: u32,
}

impl Chunk {
    /// A flat chunk with upward normals and no layers.
    pub fn new(position: Vec3) -> Self {
        Self {
            flags: ChunkFlags::default(),
            area_id: 0,
            position,
            heights: vec![0.0; VERTEX_COUNT],
            normals: vec![[0, 0, 127]; VERTEX_COUNT],
            layers: Vec::new(),
            shadow: None,
            vertex_colors: None,
            holes: HoleMask::default(),
            liquid: None,
            sound_emitters: Vec::new(),
            doodad_refs: Vec::new(),
            object_refs: Vec::new(),
            doodad_mapping: [0; 8],
            doodad_stencil: [0; 8],
            index_flags: 0,
            async_id: 0,
        }
    }
}

#[derive(Debug, Default)]
struct ChunkHeader {
    flags: u32,
    ix: u32,
    iy: u32,
    n_layers: usize,
    n_doodad_refs: usize,
    ofs_height: usize,
    ofs_normal: usize,
    ofs_layer: usize,
    ofs_refs: usize,
    ofs_alpha: usize,
    size_alpha: usize,
    ofs_shadow: usize,
    size_shadow: usize,
    area_id: u32,
    n_object_refs: usize,
    holes_low: u32,
    doodad_mapping: [u16; 8],
    doodad_stencil: [u8; 8],
    ofs_sound: usize,
    n_sound: usize,
    ofs_liquid: usize,
    size_liquid: usize,
    position: Vec3,
    ofs_vertex_colors: usize,
    holes_high: u64,
}

impl ChunkHeader {
    fn read(c: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let mut header = Self {
            flags: c.u32()?,
            ix: c.u32()?,
            iy: c.u32()?,
            n_layers: c.usize32()?,
            n_doodad_refs: c.usize32()?,
            ofs_height: c.usize32()?,
            ofs_normal: c.usize32()?,
            ofs_layer: c.usize32()?,
            ofs_refs: c.usize32()?,
            ofs_alpha: c.usize32()?,
            size_alpha: c.usize32()?,
            ofs_shadow: c.usize32()?,
            size_shadow: c.usize32()?,
            area_id: c.u32()?,
            n_object_refs: c.usize32()?,
            holes_low: c.u32()?,
            ..Self::default()
        };
        for slot in header.doodad_mapping.iter_mut() {
            *slot = c.u16()?;
        }
        for slot in header.doodad_stencil.iter_mut() {
            *slot = c.u8()?;
        }
        header.ofs_sound = c.usize32()?;
        header.n_sound = c.usize32()?;
        header.ofs_liquid = c.usize32()?;
        header.size_liquid = c.usize32()?;
        let z = c.f32()?;
        let x = c.f32()?;
        let y = c.f32()?;
        header.position = Vec3::new(x, y, z);
        header.ofs_vertex_colors = c.usize32()?;
        header.holes_high = c.u64()?;
        Ok(header)
    }

    fn write(&self, out: &mut BlockBuilder) -> Result<(), EncodeError> {
        let field = |v: usize| to_u32(v, "chunk header field");
        out.put_u32(self.flags);
        out.put_u32(self.ix);
        out.put_u32(self.iy);
        out.put_u32(field(self.n_layers)?);
        out.put_u32(field(self.n_doodad_refs)?);
        out.put_u32(field(self.ofs_height)?);
        out.put_u32(field(self.ofs_normal)?);
        out.put_u32(field(self.ofs_layer)?);
        out.put_u32(field(self.ofs_refs)?);
        out.put_u32(field(self.ofs_alpha)?);
        out.put_u32(field(self.size_alpha)?);
        out.put_u32(field(self.ofs_shadow)?);
        out.put_u32(field(self.size_shadow)?);
        out.put_u32(self.area_id);
        out.put_u32(field(self.n_object_refs)?);
        out.put_u32(self.holes_low);
        for &v in &self.doodad_mapping {
            out.put_u16(v);
        }
        out.put_bytes(&self.doodad_stencil);
        out.put_u32(field(self.ofs_sound)?);
        out.put_u32(field(self.n_sound)?);
        out.put_u32(field(self.ofs_liquid)?);
        out.put_u32(field(self.size_liquid)?);
        out.put_f32(self.position.z);
        out.put_f32(self.position.x);
        out.put_f32(self.position.y);
        out.put_u32(field(self.ofs_vertex_colors)?);
        out.put_u64(self.holes_high);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Tile-level state a chunk decode needs.
pub(crate) struct ChunkContext<'a> {
    pub alpha_format: AlphaFormat,
    pub names: &'a dyn NameResolver,
    pub doodads: usize,
    pub objects: usize,
}

/// Decodes the chunk payload in `region`. `modern` is this slot's entry from
/// the tile-level liquid block.
pub(crate) fn decode_chunk(
    region: Region<'_>,
    slot: usize,
    ctx: &ChunkContext<'_>,
    modern: Option<ModernLiquid>,
) -> Result<Chunk, DecodeError> {
    let header = ChunkHeader::read(&mut region.cursor())?;
    let (row, col) = (slot / CHUNKS_PER_SIDE, slot % CHUNKS_PER_SIDE);
    if header.ix as usize != col || header.iy as usize != row {
        tracing::warn!(
            "chunk {}: header grid position ({}, {}) does not match slot ({}, {})",
            slot,
            header.ix,
            header.iy,
            col,
            row
        );
    }
    let mut flags = ChunkFlags::unpack(header.flags);

    let mut c = region.sub(header.ofs_height, VERTEX_COUNT * 4, "height block")?.cursor();
    let heights = (0..VERTEX_COUNT).map(|_| c.f32()).collect::<Result<Vec<_>, _>>()?;

    let mut c = region.sub(header.ofs_normal, NORMAL_BLOCK_SIZE, "normal block")?.cursor();
    let normals = (0..VERTEX_COUNT)
        .map(|_| Ok([c.i8()?, c.i8()?, c.i8()?]))
        .collect::<Result<Vec<_>, DecodeError>>()?;

    let alpha_block = region.sub(header.ofs_alpha, header.size_alpha, "alpha block")?;
    let layers = decode_layers(
        region,
        header.ofs_layer,
        header.n_layers,
        alpha_block,
        ctx.alpha_format,
        ctx.names,
    )?;

    let n_refs = header.n_doodad_refs.saturating_add(header.n_object_refs);
    let mut c = region.sub(header.ofs_refs, n_refs.saturating_mul(4), "reference list")?.cursor();
    let doodad_refs = read_refs(&mut c, header.n_doodad_refs, TableKind::DoodadPlacements, ctx.doodads)?;
    let object_refs = read_refs(&mut c, header.n_object_refs, TableKind::ObjectPlacements, ctx.objects)?;

    let shadow = if flags.has_shadow {
        let block = region.sub(header.ofs_shadow, header.size_shadow, "shadow block")?;
        Some(block.bytes().to_vec())
    } else {
        None
    };

    let mut c = region
        .sub(header.ofs_sound, header.n_sound.saturating_mul(SOUND_EMITTER_SIZE), "sound emitters")?
        .cursor();
    let sound_emitters = (0..header.n_sound)
        .map(|_| {
            Ok(SoundEmitter {
                sound_id: c.u32()?,
                position: c.vec3()?,
                size: c.vec3()?,
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    let vertex_colors = if flags.has_vertex_colors {
        let mut c = region
            .sub(header.ofs_vertex_colors, VERTEX_COUNT * 4, "vertex colors")?
            .cursor();
        let colors = (0..VERTEX_COUNT)
            .map(|_| Ok([c.u8()?, c.u8()?, c.u8()?, c.u8()?]))
            .collect::<Result<Vec<_>, DecodeError>>()?;
        Some(colors)
    } else {
        None
    };

    let holes = if flags.high_res_holes {
        HoleMask::decode(header.holes_high, true)
    } else {
        HoleMask::decode(u64::from(header.holes_low), false)
    };

    let liquid = match modern {
        Some(modern) => {
            if header.ofs_liquid != 0 {
                tracing::warn!(
                    "chunk {}: legacy liquid at {} shadowed by modern liquid, ignoring it",
                    slot,
                    region.base() + header.ofs_liquid
                );
            }
            flags.clear_legacy_liquid();
            Some(LiquidBlock::Modern(modern))
        }
        None if header.ofs_liquid != 0 => {
            let record = region.sub(header.ofs_liquid, LEGACY_LIQUID_SIZE, "legacy liquid")?;
            Some(LiquidBlock::Legacy(decode_legacy(record)?))
        }
        None => None,
    };

    tracing::trace!(
        "chunk {}: {} layers, {} doodad refs, {} object refs, liquid: {}",
        slot,
        layers.len(),
        doodad_refs.len(),
        object_refs.len(),
        liquid_name(liquid.as_ref())
    );

    Ok(Chunk {
        flags,
        area_id: header.area_id,
        position: header.position,
        heights,
        normals,
        layers,
        shadow,
        vertex_colors,
        holes,
        liquid,
        sound_emitters,
        doodad_refs,
        object_refs,
        doodad_mapping: header.doodad_mapping,
        doodad_stencil: header.doodad_stencil,
        index_flags: 0,
        async_id: 0,
    })
}

fn read_refs(
    c: &mut Cursor<'_>,
    count: usize,
    table: TableKind,
    len: usize,
) -> Result<Vec<u32>, DecodeError> {
    (0..count)
        .map(|_| {
            let offset = c.position();
            let index = c.u32()?;
            if index as usize >= len {
                return Err(DecodeError::IndexOutOfRange {
                    offset,
                    table,
                    index,
                    len,
                });
            }
            Ok(index)
        })
        .collect()
}

fn liquid_name(liquid: Option<&LiquidBlock>) -> &'static str {
    match liquid {
        Some(LiquidBlock::Modern(_)) => "modern",
        Some(LiquidBlock::Legacy(_)) => "legacy",
        None => "none",
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Checks everything that would make a chunk unencodable.
pub(crate) fn validate_chunk(
    chunk: &Chunk,
    slot: usize,
    names: &dyn NameResolver,
    doodads: usize,
    objects: usize,
) -> Result<(), EncodeError> {
    let sizes = [
        ("heights", chunk.heights.len()),
        ("normals", chunk.normals.len()),
        (
            "vertex colors",
            chunk.vertex_colors.as_ref().map_or(VERTEX_COUNT, Vec::len),
        ),
    ];
    for (block, actual) in sizes {
        if actual != VERTEX_COUNT {
            return Err(EncodeError::BlockSize {
                chunk: slot,
                block,
                expected: VERTEX_COUNT,
                actual,
            });
        }
    }

    if let Some((layer, issue)) = check_layers(chunk.layers.iter().map(|l| l.alpha.is_some())) {
        return Err(EncodeError::InconsistentLayerFlags {
            chunk: slot,
            layer,
            issue,
        });
    }

    let indices = chunk
        .layers
        .iter()
        .map(|l| (TableKind::Textures, l.texture_id, names.texture_count()))
        .chain(chunk.doodad_refs.iter().map(|&r| (TableKind::DoodadPlacements, r, doodads)))
        .chain(chunk.object_refs.iter().map(|&r| (TableKind::ObjectPlacements, r, objects)));
    for (table, index, len) in indices {
        if index as usize >= len {
            return Err(EncodeError::IndexOutOfRange {
                chunk: slot,
                table,
                index,
                len,
            });
        }
    }

    if let Some(LiquidBlock::Modern(modern)) = &chunk.liquid {
        if chunk.flags.has_legacy_liquid() {
            return Err(EncodeError::InconsistentLiquid { chunk: slot });
        }
        if let Some(layer) = modern.layers.iter().find(|l| l.vertices.len() != LIQUID_VERTEX_COUNT) {
            return Err(EncodeError::BlockSize {
                chunk: slot,
                block: "liquid vertices",
                expected: LIQUID_VERTEX_COUNT,
                actual: layer.vertices.len(),
            });
        }
    }
    Ok(())
}

/// Encode-time decisions for one chunk, made by the tile encoder.
pub(crate) struct ChunkPlan<'a> {
    /// Chunk flags with liquid flags already adjusted.
    pub flags: ChunkFlags,
    /// Hole mask at the resolution to write.
    pub holes: HoleMask,
    /// Legacy liquid to embed, if any.
    pub legacy: Option<Cow<'a, LegacyLiquid>>,
}

/// Encodes one validated chunk into a standalone payload.
pub(crate) fn encode_chunk(
    chunk: &Chunk,
    slot: usize,
    plan: &ChunkPlan<'_>,
    format: AlphaFormat,
) -> Result<Vec<u8>, EncodeError> {
    let mut body = BlockBuilder::new();

    let mut heights = BlockBuilder::with_capacity(VERTEX_COUNT * 4);
    for &h in &chunk.heights {
        heights.put_f32(h);
    }
    let height = body.append_block(&heights.into_inner());

    let mut normals = BlockBuilder::with_capacity(NORMAL_BLOCK_SIZE);
    for n in &chunk.normals {
        n.iter().for_each(|&v| normals.put_i8(v));
    }
    let mut normals = normals.into_inner();
    normals.resize(NORMAL_BLOCK_SIZE, 0);
    let normal = body.append_block(&normals);

    let encoded_layers = encode_layers(&chunk.layers, format)?;
    let layer = body.append_block(&encoded_layers.table);

    let mut refs = BlockBuilder::new();
    for &r in chunk.doodad_refs.iter().chain(&chunk.object_refs) {
        refs.put_u32(r);
    }
    let refs = body.append_block(&refs.into_inner());

    let alpha = body.append_block(&encoded_layers.alpha);

    let shadow = match &chunk.shadow {
        Some(bytes) => body.append_block(bytes),
        None => BlockRange::default(),
    };

    let liquid = match &plan.legacy {
        Some(legacy) => body.append_block(&encode_legacy(legacy)),
        None => BlockRange::default(),
    };

    let mut sounds = BlockBuilder::with_capacity(chunk.sound_emitters.len() * SOUND_EMITTER_SIZE);
    for emitter in &chunk.sound_emitters {
        sounds.put_u32(emitter.sound_id);
        sounds.put_vec3(emitter.position);
        sounds.put_vec3(emitter.size);
    }
    let sound = body.append_block(&sounds.into_inner());

    let colors = match &chunk.vertex_colors {
        Some(colors) => body.append_block(colors.as_flattened()),
        None => BlockRange::default(),
    };

    let flags = ChunkFlags {
        has_shadow: chunk.shadow.is_some(),
        has_vertex_colors: chunk.vertex_colors.is_some(),
        high_res_holes: plan.holes.is_high_res(),
        ..plan.flags
    };
    let (holes_low, holes_high) = if plan.holes.is_high_res() {
        (0, plan.holes.encode())
    } else {
        (plan.holes.encode() as u32, 0)
    };
    let at = |range: BlockRange| -> Result<usize, EncodeError> {
        Ok(range.offset_u32(CHUNK_HEADER_SIZE, true, "chunk payload")? as usize)
    };

    let header = ChunkHeader {
        flags: flags.pack(),
        ix: (slot % CHUNKS_PER_SIDE) as u32,
        iy: (slot / CHUNKS_PER_SIDE) as u32,
        n_layers: chunk.layers.len(),
        n_doodad_refs: chunk.doodad_refs.len(),
        ofs_height: at(height)?,
        ofs_normal: at(normal)?,
        ofs_layer: at(layer)?,
        ofs_refs: at(refs)?,
        ofs_alpha: at(alpha)?,
        size_alpha: alpha.len,
        ofs_shadow: at(shadow)?,
        size_shadow: shadow.len,
        area_id: chunk.area_id,
        n_object_refs: chunk.object_refs.len(),
        holes_low,
        doodad_mapping: chunk.doodad_mapping,
        doodad_stencil: chunk.doodad_stencil,
        ofs_sound: at(sound)?,
        n_sound: chunk.sound_emitters.len(),
        ofs_liquid: at(liquid)?,
        size_liquid: liquid.len,
        position: chunk.position,
        ofs_vertex_colors: at(colors)?,
        holes_high,
    };

    let body = body.into_inner();
    let mut out = BlockBuilder::with_capacity(CHUNK_HEADER_SIZE + body.len());
    header.write(&mut out)?;
    out.put_bytes(&body);
    Ok(out.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
