//! End-to-end tests over the public tile API: build a tile in memory, encode
//! it, decode it, and check what survives.

use glam::Vec3;
use nebula_tile::alpha::ALPHA_CELLS;
use nebula_tile::tile::TILE_HEADER_SIZE;
use nebula_tile::{
    AlphaFormat, AlphaMap, DecodeError, DoodadPlacement, EncodeConfig, EncodeError,
    FlightBounds, HoleResolution, LegacyLiquid, LiquidBlock, LiquidFormat, LiquidKind, LiquidLayer,
    ModernLiquid, ObjectPlacement, TableKind, TextureFlags, TextureLayer, Tile, decode_tile,
    encode_tile, encode_tile_into,
};

fn u32_at(bytes: &[u8], offset: usize) -> usize {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]) as usize
}

fn two_textures() -> Tile {
    let mut tile = Tile::new();
    tile.names.textures = vec!["tileset/grass.blp".into(), "tileset/rock.blp".into()];
    tile
}

/// A tile touching every block the format has.
fn rich_tile() -> Tile {
    let mut tile = two_textures();
    tile.names.models = vec!["world/tree01.m2".into(), "world/bush.m2".into()];
    tile.names.objects = vec!["world/keep.wmo".into()];
    tile.texture_flags = Some(vec![
        TextureFlags::default(),
        TextureFlags {
            use_cube_map: true,
            other: 0,
        },
    ]);
    tile.doodads = vec![
        DoodadPlacement::new(0, 10, Vec3::new(1.0, 2.0, 3.0)),
        DoodadPlacement::new(1, 11, Vec3::new(-4.0, 5.5, 0.0)),
    ];
    tile.objects = vec![ObjectPlacement {
        name_id: 0,
        unique_id: 99,
        position: Vec3::new(100.0, 50.0, 12.0),
        rotation: Vec3::new(0.0, 180.0, 0.0),
        extents: [Vec3::splat(-20.0), Vec3::splat(20.0)],
        flags: 0,
        doodad_set: 1,
        name_set: 0,
        scale: 1024,
    }];
    tile.flight_bounds = Some(FlightBounds::flat(900, -100));

    let mut gradient = AlphaMap::filled(0);
    for x in 0..64 {
        gradient.set(x, 0, (x * 4) as u8);
    }

    let chunk = tile.chunk_mut(0, 0).expect("chunk (0, 0)");
    chunk.area_id = 40;
    chunk.heights[10] = 3.25;
    chunk.layers = vec![TextureLayer::base(0), TextureLayer::blended(1, gradient)];
    chunk.layers[1].effect_id = Some(7);
    chunk.holes.set(2, 3, true);
    chunk.doodad_refs = vec![0, 1];
    chunk.object_refs = vec![0];
    let mut layer = LiquidLayer::new(2, 1.0, 4.0);
    layer.set_rendered(0, 0, false);
    if let Some(v) = layer.vertex_mut(4, 4) {
        v.height = 3.5;
        v.depth = 200;
    }
    let mut modern = ModernLiquid::with_layer(layer);
    modern.fatigue = 0xF0;
    chunk.liquid = Some(LiquidBlock::Modern(modern));

    let chunk = tile.chunk_mut(0, 1).expect("chunk (0, 1)");
    chunk.flags.magma = true;
    chunk.liquid = Some(LiquidBlock::Legacy(LegacyLiquid::new(LiquidKind::Magma, -2.0)));

    let chunk = tile.chunk_mut(15, 15).expect("chunk (15, 15)");
    chunk.holes = nebula_tile::HoleMask::high_res(0x0102_0304_0506_0708);
    chunk.shadow = Some(vec![0x55; 512]);
    chunk.vertex_colors = Some(vec![[10, 20, 30, 255]; nebula_tile::chunk::VERTEX_COUNT]);

    tile
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn test_layers_holes_and_liquid_survive_two_cycles() {
    let mut tile = two_textures();
    let chunk = tile.chunk_mut(0, 0).expect("chunk (0, 0)");
    chunk.layers = vec![
        TextureLayer::base(0),
        TextureLayer::blended(1, AlphaMap::filled(128)),
    ];
    chunk.holes.set(1, 1, true);
    chunk.liquid = Some(LiquidBlock::Modern(ModernLiquid::with_layer(LiquidLayer::new(
        1, 0.0, 5.0,
    ))));

    let config = EncodeConfig::default();
    let first = decode_tile(&encode_tile(&tile, &config).unwrap()).unwrap();
    let second = decode_tile(&encode_tile(&first, &config).unwrap()).unwrap();

    for decoded in [&first, &second] {
        let chunk = decoded.chunk(0, 0).unwrap();
        assert_eq!(chunk.layers.len(), 2);
        assert!(!chunk.layers[0].flags.use_alpha_map);
        assert!(chunk.layers[1].flags.use_alpha_map);
        assert!(!chunk.layers[1].flags.alpha_compressed);

        let alpha = chunk.layers[1].alpha.as_ref().expect("blend layer alpha");
        assert_eq!(alpha.weights().len(), ALPHA_CELLS);
        assert!(alpha.weights().iter().all(|&w| w.abs_diff(128) <= 8));

        assert!(!chunk.holes.is_high_res());
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(chunk.holes.get(row, col), (row, col) == (1, 1));
            }
        }

        let modern = chunk
            .liquid
            .as_ref()
            .and_then(LiquidBlock::as_modern)
            .expect("modern liquid");
        assert_eq!(modern.layers.len(), 1);
        assert_eq!(modern.layers[0].liquid_id, 1);
        assert_eq!(modern.layers[0].min_height, 0.0);
        assert_eq!(modern.layers[0].max_height, 5.0);
        assert_eq!(modern.layers[0].coverage(), nebula_tile::LiquidRect::FULL);
    }
    assert_eq!(first.chunk(0, 0).unwrap().layers, second.chunk(0, 0).unwrap().layers);
}

#[test]
fn test_decode_encode_decode_is_stable() {
    let tile = rich_tile();
    let config = EncodeConfig {
        alpha_format: AlphaFormat::RunLength2Bit,
        ..EncodeConfig::default()
    };
    let first = decode_tile(&encode_tile(&tile, &config).unwrap()).unwrap();
    assert!(!first.flags.big_alpha);

    let again = EncodeConfig {
        alpha_format: AlphaFormat::from_big_alpha(first.flags.big_alpha),
        ..EncodeConfig::default()
    };
    let second = decode_tile(&encode_tile(&first, &again).unwrap()).unwrap();
    assert_eq!(first, second);

    // Tables and placements come back verbatim.
    assert_eq!(first.names, tile.names);
    assert_eq!(first.texture_flags, tile.texture_flags);
    assert_eq!(first.doodads, tile.doodads);
    assert_eq!(first.objects, tile.objects);
    assert_eq!(first.flight_bounds, tile.flight_bounds);
    assert_eq!(first.chunk(15, 15).unwrap().holes, tile.chunk(15, 15).unwrap().holes);
    assert_eq!(first.chunk(0, 1).unwrap().liquid, tile.chunk(0, 1).unwrap().liquid);
    assert_eq!(first.chunk(0, 0).unwrap().liquid, tile.chunk(0, 0).unwrap().liquid);
}

#[test]
fn test_run_length_alpha_requantizes_to_levels() {
    let tile = rich_tile();
    let config = EncodeConfig {
        alpha_format: AlphaFormat::RunLength2Bit,
        ..EncodeConfig::default()
    };
    let decoded = decode_tile(&encode_tile(&tile, &config).unwrap()).unwrap();
    let layer = &decoded.chunk(0, 0).unwrap().layers[1];
    assert!(layer.flags.alpha_compressed);
    let original = tile.chunk(0, 0).unwrap().layers[1].alpha.as_ref().unwrap();
    assert_eq!(
        layer.alpha.as_ref(),
        Some(&original.quantized(AlphaFormat::RunLength2Bit))
    );
}

#[test]
fn test_concurrent_decodes_are_independent() {
    let bytes = encode_tile(&rich_tile(), &EncodeConfig::default()).unwrap();
    let expected = decode_tile(&bytes).unwrap();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| decode_tile(&bytes))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().as_ref(), Ok(&expected));
        }
    });
}

// ---------------------------------------------------------------------------
// Encode policies
// ---------------------------------------------------------------------------

#[test]
fn test_modern_liquid_written_as_legacy() {
    let mut tile = Tile::new();
    let mut layer = LiquidLayer::new(2, 1.5, 2.5);
    layer.set_rendered(7, 7, false);
    tile.chunks[9].liquid = Some(LiquidBlock::Modern(ModernLiquid::with_layer(layer)));

    let config = EncodeConfig {
        liquid_format: LiquidFormat::Legacy,
        ..EncodeConfig::default()
    };
    let bytes = encode_tile(&tile, &config).unwrap();
    assert_eq!(u32_at(&bytes, 0x48), 0, "no modern block expected");

    let decoded = decode_tile(&bytes).unwrap();
    let chunk = &decoded.chunks[9];
    assert!(chunk.flags.ocean);
    let legacy = chunk
        .liquid
        .as_ref()
        .and_then(LiquidBlock::as_legacy)
        .expect("legacy liquid");
    assert_eq!(legacy.kind(), LiquidKind::Ocean);
    assert_eq!((legacy.min_height, legacy.max_height), (1.5, 2.5));
    assert!(legacy.tile(7, 7).unwrap().dont_render);
    assert!(!legacy.tile(0, 0).unwrap().dont_render);
}

#[test]
fn test_legacy_liquid_written_as_modern() {
    let mut tile = Tile::new();
    tile.chunks[3].flags.slime = true;
    tile.chunks[3].liquid = Some(LiquidBlock::Legacy(LegacyLiquid::new(LiquidKind::Slime, 6.0)));

    let config = EncodeConfig {
        liquid_format: LiquidFormat::Modern,
        ..EncodeConfig::default()
    };
    let decoded = decode_tile(&encode_tile(&tile, &config).unwrap()).unwrap();
    let chunk = &decoded.chunks[3];
    assert!(!chunk.flags.has_legacy_liquid());
    let modern = chunk
        .liquid
        .as_ref()
        .and_then(LiquidBlock::as_modern)
        .expect("modern liquid");
    assert_eq!(modern.layers.len(), 1);
    assert_eq!(LiquidKind::from_liquid_id(modern.layers[0].liquid_id), LiquidKind::Slime);
    assert_eq!(modern.layers[0].min_height, 6.0);
}

#[test]
fn test_hole_resolution_policy() {
    let mut tile = Tile::new();
    tile.chunks[0].holes.set(1, 1, true);

    let high = EncodeConfig {
        hole_resolution: HoleResolution::High,
        ..EncodeConfig::default()
    };
    let decoded = decode_tile(&encode_tile(&tile, &high).unwrap()).unwrap();
    let holes = decoded.chunks[0].holes;
    assert!(decoded.chunks[0].flags.high_res_holes);
    assert!(holes.is_high_res());
    for (row, col) in [(2, 2), (2, 3), (3, 2), (3, 3)] {
        assert!(holes.get(row, col), "expected hole at ({row}, {col})");
    }
    assert!(!holes.get(1, 1));

    let low = EncodeConfig {
        hole_resolution: HoleResolution::Low,
        ..EncodeConfig::default()
    };
    let back = decode_tile(&encode_tile(&decoded, &low).unwrap()).unwrap();
    assert_eq!(back.chunks[0].holes, tile.chunks[0].holes);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_inconsistent_liquid_leaves_buffer_untouched() {
    let mut tile = Tile::new();
    tile.chunks[5].flags.river = true;
    tile.chunks[5].liquid = Some(LiquidBlock::Modern(ModernLiquid::with_layer(LiquidLayer::new(
        1, 0.0, 1.0,
    ))));

    let mut out = vec![1, 2, 3];
    let result = encode_tile_into(&tile, &EncodeConfig::default(), &mut out);
    assert_eq!(result, Err(EncodeError::InconsistentLiquid { chunk: 5 }));
    assert_eq!(out, [1, 2, 3]);
}

#[test]
fn test_encode_into_appends() {
    let mut out = vec![0xEE];
    encode_tile_into(&Tile::new(), &EncodeConfig::default(), &mut out).unwrap();
    assert_eq!(out[0], 0xEE);
    assert_eq!(&out[1..5], b"NTIL");
}

#[test]
fn test_chunk_offset_past_end() {
    let mut bytes = encode_tile(&Tile::new(), &EncodeConfig::default()).unwrap();
    let len = bytes.len();
    let entry = TILE_HEADER_SIZE + 16 * 200;
    bytes[entry..entry + 4].copy_from_slice(&(len as u32).to_le_bytes());
    let err = decode_tile(&bytes).unwrap_err();
    assert_eq!(err, DecodeError::InvalidOffset { offset: len, what: "chunk" });
    assert_eq!(err.offset(), len);
}

#[test]
fn test_truncated_tile() {
    let bytes = encode_tile(&rich_tile(), &EncodeConfig::default()).unwrap();
    let result = decode_tile(&bytes[..bytes.len() - 1]);
    assert!(result.is_err(), "expected error, got {result:?}");
}

#[test]
fn test_unknown_liquid_format_tag() {
    let mut tile = Tile::new();
    tile.chunks[0].liquid = Some(LiquidBlock::Modern(ModernLiquid::with_layer(LiquidLayer::new(
        1, 0.0, 1.0,
    ))));
    let mut bytes = encode_tile(&tile, &EncodeConfig::default()).unwrap();
    let block = u32_at(&bytes, 0x48);
    let info = block + u32_at(&bytes, block);
    bytes[info + 2..info + 4].copy_from_slice(&9u16.to_le_bytes());

    assert_eq!(
        decode_tile(&bytes),
        Err(DecodeError::UnknownFormatTag {
            offset: info + 2,
            tag: 9
        })
    );

    bytes[info + 2..info + 4].copy_from_slice(&0u16.to_le_bytes());
    // width 9 reaches past the 8×8 grid
    bytes[info + 14] = 9;
    assert_eq!(decode_tile(&bytes), Err(DecodeError::InvalidCoverage { offset: info }));
}

#[test]
fn test_doodad_name_out_of_range() {
    let mut tile = Tile::new();
    tile.names.models = vec!["world/tree01.m2".into()];
    tile.doodads = vec![DoodadPlacement::new(0, 1, Vec3::ZERO)];
    let mut bytes = encode_tile(&tile, &EncodeConfig::default()).unwrap();
    let doodads = u32_at(&bytes, 0x38);
    bytes[doodads..doodads + 4].copy_from_slice(&3u32.to_le_bytes());

    assert_eq!(
        decode_tile(&bytes),
        Err(DecodeError::IndexOutOfRange {
            offset: doodads,
            table: TableKind::Models,
            index: 3,
            len: 1,
        })
    );
}

#[test]
fn test_run_length_underrun_and_overrun() {
    // 32 fills of 127 plus one of 31: 4095 cells.
    let mut stream: Vec<u8> = [0xFF, 0x01].repeat(32);
    stream.extend_from_slice(&[0x80 | 31, 0x01]);
    assert_eq!(
        AlphaMap::decode(&stream, AlphaFormat::RunLength2Bit, 100),
        Err(DecodeError::AlphaStreamUnderrun {
            offset: 100 + stream.len(),
            expected: ALPHA_CELLS,
            actual: ALPHA_CELLS - 1,
        })
    );

    let stream: Vec<u8> = [0xFF, 0x02].repeat(33);
    assert_eq!(
        AlphaMap::decode(&stream, AlphaFormat::RunLength2Bit, 10),
        Err(DecodeError::AlphaStreamOverrun {
            offset: 10 + 64,
            expected: ALPHA_CELLS,
        })
    );
}
