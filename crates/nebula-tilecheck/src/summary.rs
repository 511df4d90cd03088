//! Human and JSON summaries of a decoded tile.

use std::fmt;

use nebula_tile::tile::CHUNKS_PER_SIDE;
use nebula_tile::{AlphaFormat, Chunk, LiquidBlock, Tile};
use serde::Serialize;

/// Totals over one tile, plus an optional per-chunk listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileSummary {
    pub bytes: usize,
    pub alpha_format: &'static str,
    pub textures: usize,
    pub models: usize,
    pub objects: usize,
    pub doodad_placements: usize,
    pub object_placements: usize,
    /// Number of chunks with 0, 1, 2, 3 and 4 texture layers.
    pub layer_histogram: [usize; 5],
    pub chunks_with_holes: usize,
    pub high_res_hole_chunks: usize,
    pub modern_liquid_chunks: usize,
    pub legacy_liquid_chunks: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<ChunkSummary>,
}

/// One line of the per-chunk listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSummary {
    pub row: usize,
    pub col: usize,
    pub area_id: u32,
    pub layers: usize,
    pub holes: usize,
    pub liquid: Option<&'static str>,
    pub doodad_refs: usize,
    pub object_refs: usize,
}

impl ChunkSummary {
    fn new(slot: usize, chunk: &Chunk) -> Self {
        let holes = (0..chunk.holes.side())
            .flat_map(|row| (0..chunk.holes.side()).map(move |col| (row, col)))
            .filter(|&(row, col)| chunk.holes.get(row, col))
            .count();
        Self {
            row: slot / CHUNKS_PER_SIDE,
            col: slot % CHUNKS_PER_SIDE,
            area_id: chunk.area_id,
            layers: chunk.layers.len(),
            holes,
            liquid: chunk.liquid.as_ref().map(liquid_name),
            doodad_refs: chunk.doodad_refs.len(),
            object_refs: chunk.object_refs.len(),
        }
    }
}

fn liquid_name(liquid: &LiquidBlock) -> &'static str {
    match liquid {
        LiquidBlock::Modern(_) => "modern",
        LiquidBlock::Legacy(_) => "legacy",
    }
}

impl TileSummary {
    /// Summarizes `tile`, decoded from a buffer of `bytes` bytes.
    pub fn new(tile: &Tile, bytes: usize, list_chunks: bool) -> Self {
        let mut layer_histogram = [0; 5];
        for chunk in &tile.chunks {
            layer_histogram[chunk.layers.len().min(4)] += 1;
        }
        let liquid_count = |modern: bool| {
            tile.chunks
                .iter()
                .filter(|c| match &c.liquid {
                    Some(LiquidBlock::Modern(_)) => modern,
                    Some(LiquidBlock::Legacy(_)) => !modern,
                    None => false,
                })
                .count()
        };
        let alpha_format = match AlphaFormat::from_big_alpha(tile.flags.big_alpha) {
            AlphaFormat::Packed4Bit => "packed-4bit",
            AlphaFormat::RunLength2Bit => "run-length-2bit",
        };

        Self {
            bytes,
            alpha_format,
            textures: tile.names.textures.len(),
            models: tile.names.models.len(),
            objects: tile.names.objects.len(),
            doodad_placements: tile.doodads.len(),
            object_placements: tile.objects.len(),
            layer_histogram,
            chunks_with_holes: tile.chunks.iter().filter(|c| !c.holes.is_empty()).count(),
            high_res_hole_chunks: tile.chunks.iter().filter(|c| c.holes.is_high_res()).count(),
            modern_liquid_chunks: liquid_count(true),
            legacy_liquid_chunks: liquid_count(false),
            chunks: if list_chunks {
                tile.chunks
                    .iter()
                    .enumerate()
                    .map(|(slot, chunk)| ChunkSummary::new(slot, chunk))
                    .collect()
            } else {
                Vec::new()
            },
        }
    }
}

impl fmt::Display for TileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tile: {} bytes, {} alpha", self.bytes, self.alpha_format)?;
        writeln!(
            f,
            "names: {} textures, {} models, {} objects",
            self.textures, self.models, self.objects
        )?;
        writeln!(
            f,
            "placements: {} doodads, {} objects",
            self.doodad_placements, self.object_placements
        )?;
        writeln!(f, "layers per chunk (0..=4): {:?}", self.layer_histogram)?;
        writeln!(
            f,
            "holes: {} chunks ({} high-res)",
            self.chunks_with_holes, self.high_res_hole_chunks
        )?;
        write!(
            f,
            "liquid: {} modern, {} legacy",
            self.modern_liquid_chunks, self.legacy_liquid_chunks
        )?;
        for chunk in &self.chunks {
            write!(
                f,
                "\n  [{:2},{:2}] area {:5} layers {} holes {:2} liquid {:6} refs {}/{}",
                chunk.row,
                chunk.col,
                chunk.area_id,
                chunk.layers,
                chunk.holes,
                chunk.liquid.unwrap_or("-"),
                chunk.doodad_refs,
                chunk.object_refs
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
