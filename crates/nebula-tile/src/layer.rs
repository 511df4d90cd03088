//! Per-chunk texture layer table and its alpha block.
//!
//! Each table entry is 16 bytes: texture index, flags, alpha offset (relative
//! to the chunk's alpha block) and effect id. The first layer is the opaque
//! base and never has an alpha map; every later layer must have one.

use crate::alpha::{AlphaFormat, AlphaMap};
use crate::error::{DecodeError, EncodeError, LayerIssue, TableKind};
use crate::flags::LayerFlags;
use crate::io::{BlockBuilder, Region, to_u32};
use crate::names::NameResolver;

/// Maximum number of texture layers per chunk.
pub const MAX_LAYERS: usize = 4;

/// Size of one layer table entry in bytes.
pub const LAYER_ENTRY_SIZE: usize = 16;

/// Effect id meaning "no special effect".
const NO_EFFECT: u32 = 0xFFFF_FFFF;

/// One texture layer of a chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureLayer {
    /// Index into the tile's texture name table.
    pub texture_id: u32,
    /// Animation and blending flags.
    pub flags: LayerFlags,
    /// Ground effect reference, `None` when the layer has no effect.
    pub effect_id: Option<u32>,
    /// Blend weights; `None` for the base layer.
    pub alpha: Option<AlphaMap>,
}

impl TextureLayer {
    /// Creates the opaque base layer.
    pub fn base(texture_id: u32) -> Self {
        Self {
            texture_id,
            flags: LayerFlags::default(),
            effect_id: None,
            alpha: None,
        }
    }

    /// Creates a blend layer with the given alpha map.
    pub fn blended(texture_id: u32, alpha: AlphaMap) -> Self {
        Self {
            texture_id,
            flags: LayerFlags {
                use_alpha_map: true,
                ..LayerFlags::default()
            },
            effect_id: None,
            alpha: Some(alpha),
        }
    }
}

/// Checks the alpha rules for a layer list, returning the first violation.
pub(crate) fn check_layers(
    alphas: impl ExactSizeIterator<Item = bool>,
) -> Option<(usize, LayerIssue)> {
    let count = alphas.len();
    if count > MAX_LAYERS {
        return Some((count - 1, LayerIssue::TooManyLayers(count)));
    }
    alphas
        .enumerate()
        .find_map(|(i, has_alpha)| layer_flag_issue(i, has_alpha))
}

/// Decodes `count` layer entries at `offset` within `chunk`, and their alpha
/// maps from `alpha_block`.
pub(crate) fn decode_layers(
    chunk: Region<'_>,
    offset: usize,
    count: usize,
    alpha_block: Region<'_>,
    format: AlphaFormat,
    names: &dyn NameResolver,
) -> Result<Vec<TextureLayer>, DecodeError> {
    if count > MAX_LAYERS {
        return Err(DecodeError::InconsistentLayerFlags {
            offset: chunk.base() + offset,
            layer: count - 1,
            issue: LayerIssue::TooManyLayers(count),
        });
    }

    let table = chunk.sub(offset, count * LAYER_ENTRY_SIZE, "layer table")?;
    let mut cursor = table.cursor();
    let mut layers = Vec::with_capacity(count);
    for i in 0..count {
        let entry_offset = cursor.position();
        let texture_id = cursor.u32()?;
        let mut flags = LayerFlags::unpack(cursor.u32()?);
        // The tile's alpha format decides compression, not the per-layer bit.
        flags.alpha_compressed = flags.use_alpha_map && format == AlphaFormat::RunLength2Bit;
        let alpha_offset = cursor.usize32()?;
        let effect_id = cursor.u32()?;

        if let Some((layer, issue)) = layer_flag_issue(i, flags.use_alpha_map) {
            return Err(DecodeError::InconsistentLayerFlags {
                offset: entry_offset,
                layer,
                issue,
            });
        }

        if texture_id as usize >= names.texture_count() {
            return Err(DecodeError::IndexOutOfRange {
                offset: entry_offset,
                table: TableKind::Textures,
                index: texture_id,
                len: names.texture_count(),
            });
        }

        let alpha = if flags.use_alpha_map {
            let stream = alpha_block.tail(alpha_offset, "alpha map")?;
            Some(AlphaMap::decode(stream.bytes(), format, stream.base())?)
        } else {
            None
        };

        layers.push(TextureLayer {
            texture_id,
            flags,
            effect_id: (effect_id != NO_EFFECT).then_some(effect_id),
            alpha,
        });
    }
    Ok(layers)
}

fn layer_flag_issue(index: usize, use_alpha: bool) -> Option<(usize, LayerIssue)> {
    match (index, use_alpha) {
        (0, true) => Some((0, LayerIssue::BaseLayerUsesAlpha)),
        (i, false) if i > 0 => Some((i, LayerIssue::MissingAlpha)),
        _ => None,
    }
}

/// Encoded layer table and alpha block for one chunk.
pub(crate) struct EncodedLayers {
    pub table: Vec<u8>,
    pub alpha: Vec<u8>,
}

/// Encodes a validated layer list. Alpha maps are written first so their
/// offsets are known when the table is built.
pub(crate) fn encode_layers(
    layers: &[TextureLayer],
    format: AlphaFormat,
) -> Result<EncodedLayers, EncodeError> {
    let mut alpha = BlockBuilder::new();
    let mut offsets = Vec::with_capacity(layers.len());
    for layer in layers {
        let offset = match &layer.alpha {
            Some(map) => to_u32(alpha.append_block(&map.encode(format)).offset, "alpha block")?,
            None => 0,
        };
        offsets.push(offset);
    }

    let mut table = BlockBuilder::with_capacity(layers.len() * LAYER_ENTRY_SIZE);
    for (layer, offset) in layers.iter().zip(offsets) {
        let has_alpha = layer.alpha.is_some();
        let flags = LayerFlags {
            use_alpha_map: has_alpha,
            alpha_compressed: has_alpha && format == AlphaFormat::RunLength2Bit,
            ..layer.flags
        };
        table.put_u32(layer.texture_id);
        table.put_u32(flags.pack());
        table.put_u32(offset);
        table.put_u32(layer.effect_id.unwrap_or(NO_EFFECT));
    }

    Ok(EncodedLayers {
        table: table.into_inner(),
        alpha: alpha.into_inner(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
