//! Conversion between the two liquid generations, used when the encoder is
//! told to write one generation only.

use crate::flags::{ChunkFlags, LiquidTileFlags};

use super::legacy::{LegacyLiquid, LegacyVertex, LegacyVertexData};
use super::modern::{LIQUID_GRID_SIDE, LiquidLayer, LiquidVertex, LiquidVertexFormat, ModernLiquid};
use super::LiquidKind;

/// Converts legacy liquid into a single modern layer.
///
/// Hidden tiles become unrendered units; per-tile fishable and fatigue bits
/// become the attribute masks.
pub(crate) fn legacy_to_modern(legacy: &LegacyLiquid) -> ModernLiquid {
    let kind = legacy.kind();
    let vertex_format = if kind.is_magma_style() {
        LiquidVertexFormat::HeightUv
    } else {
        LiquidVertexFormat::HeightDepth
    };

    let vertices = legacy
        .vertices
        .iter()
        .map(|vertex| match vertex.data {
            LegacyVertexData::Water { depth, .. } => LiquidVertex {
                height: vertex.height,
                depth,
                uv: [0; 2],
            },
            LegacyVertexData::Magma { u, v } => LiquidVertex {
                height: vertex.height,
                depth: 0,
                uv: [u, v],
            },
        })
        .collect();

    let mut render = 0u64;
    let mut fishable = 0u64;
    let mut fatigue = 0u64;
    for (i, tile) in legacy.tiles.iter().enumerate() {
        let bit = 1u64 << i;
        if !tile.dont_render {
            render |= bit;
        }
        if tile.fishable {
            fishable |= bit;
        }
        if tile.fatigue {
            fatigue |= bit;
        }
    }

    ModernLiquid {
        layers: vec![LiquidLayer {
            liquid_id: kind.liquid_id(),
            vertex_format,
            min_height: legacy.min_height,
            max_height: legacy.max_height,
            render,
            vertices,
        }],
        fishable,
        fatigue,
    }
}

/// Converts modern liquid to legacy using its first layer.
///
/// Returns `None` when there are no layers. Extra layers are dropped with a
/// warning.
pub(crate) fn modern_to_legacy(modern: &ModernLiquid, chunk: usize) -> Option<LegacyLiquid> {
    let layer = modern.layers.first()?;
    if modern.layers.len() > 1 {
        tracing::warn!(
            "chunk {}: dropping {} liquid layers when writing legacy liquid",
            chunk,
            modern.layers.len() - 1
        );
    }

    let kind = LiquidKind::from_liquid_id(layer.liquid_id);
    let mut legacy = LegacyLiquid::new(kind, layer.min_height);
    legacy.max_height = layer.max_height;

    for (out, vertex) in legacy.vertices.iter_mut().zip(&layer.vertices) {
        let data = if kind.is_magma_style() {
            LegacyVertexData::Magma {
                u: vertex.uv[0],
                v: vertex.uv[1],
            }
        } else {
            LegacyVertexData::Water {
                depth: vertex.depth,
                flow: [0; 2],
                filler: 0,
            }
        };
        *out = LegacyVertex {
            data,
            height: vertex.height,
        };
    }

    for (i, tile) in legacy.tiles.iter_mut().enumerate() {
        let bit = 1u64 << i;
        *tile = LiquidTileFlags {
            liquid_type: kind.legacy_type(),
            dont_render: !layer.is_rendered(i / LIQUID_GRID_SIDE, i % LIQUID_GRID_SIDE),
            fishable: modern.fishable & bit != 0,
            fatigue: modern.fatigue & bit != 0,
            ..LiquidTileFlags::default()
        };
    }
    Some(legacy)
}

/// Sets the chunk's legacy liquid type flag to match `kind`.
pub(crate) fn set_legacy_flags(flags: &mut ChunkFlags, kind: LiquidKind) {
    flags.clear_legacy_liquid();
    match kind {
        LiquidKind::Water => flags.river = true,
        LiquidKind::Ocean => flags.ocean = true,
        LiquidKind::Magma => flags.magma = true,
        LiquidKind::Slime => flags.slime = true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_to_modern_single_layer() {
        let mut legacy = LegacyLiquid::new(LiquidKind::Ocean, 1.0);
        legacy.max_height = 2.0;
        legacy.tiles[9].dont_render = true;
        legacy.tiles[3].fishable = false;
        legacy.tiles[4].fatigue = true;
        legacy.vertices[10].height = 2.0;

        let modern = legacy_to_modern(&legacy);
        assert_eq!(modern.layers.len(), 1);
        let layer = &modern.layers[0];
        assert_eq!(layer.liquid_id, 2);
        assert_eq!(layer.vertex_format, LiquidVertexFormat::HeightDepth);
        assert_eq!((layer.min_height, layer.max_height), (1.0, 2.0));
        assert!(!layer.is_rendered(1, 1));
        assert!(layer.is_rendered(1, 2));
        assert_eq!(layer.vertices[10].height, 2.0);
        assert_eq!(modern.fishable, !(1u64 << 3));
        assert_eq!(modern.fatigue, 1u64 << 4);
    }

    #[test]
    fn test_magma_keeps_texture_coordinates() {
        let mut legacy = LegacyLiquid::new(LiquidKind::Magma, 0.0);
        legacy.vertices[5].data = LegacyVertexData::Magma { u: 7, v: 9 };

        let modern = legacy_to_modern(&legacy);
        assert_eq!(modern.layers[0].vertex_format, LiquidVertexFormat::HeightUv);
        assert_eq!(modern.layers[0].vertices[5].uv, [7, 9]);

        let back = modern_to_legacy(&modern, 0).unwrap();
        assert_eq!(back.kind(), LiquidKind::Magma);
        assert_eq!(back.vertices[5].data, LegacyVertexData::Magma { u: 7, v: 9 });
    }

    #[test]
    fn test_modern_to_legacy_keeps_first_layer() {
        let mut first = LiquidLayer::new(1, 0.0, 5.0);
        first.set_rendered(7, 7, false);
        first.vertices[80].depth = 33;
        let modern = ModernLiquid {
            layers: vec![first, LiquidLayer::new(3, 10.0, 11.0)],
            ..ModernLiquid::default()
        };

        let legacy = modern_to_legacy(&modern, 4).unwrap();
        assert_eq!(legacy.kind(), LiquidKind::Water);
        assert_eq!((legacy.min_height, legacy.max_height), (0.0, 5.0));
        assert!(legacy.tiles[63].dont_render);
        assert!(legacy.tiles.iter().all(|t| t.fishable && !t.fatigue));
        assert!(matches!(
            legacy.vertices[80].data,
            LegacyVertexData::Water { depth: 33, .. }
        ));
    }

    #[test]
    fn test_modern_without_layers_has_no_legacy_form() {
        assert_eq!(modern_to_legacy(&ModernLiquid::default(), 0), None);
    }

    #[test]
    fn test_set_legacy_flags() {
        let mut flags = ChunkFlags {
            river: true,
            impassable: true,
            ..ChunkFlags::default()
        };
        set_legacy_flags(&mut flags, LiquidKind::Slime);
        assert!(flags.slime && !flags.river && flags.impassable);
    }
}
