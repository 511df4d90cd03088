//! Alpha-map (texture blend weight) codecs.
//!
//! An alpha map is a 64×64 raster of 0–255 weights. Two physical encodings
//! exist, and both quantize:
//!
//! | Format | Storage | Decode | Encode | Max error |
//! |--------|---------|--------|--------|-----------|
//! | Packed 4-bit | 2048 bytes, two cells per byte, low nibble first | `n * 17` | `(w + 8) / 17` | ±8 |
//! | Run-length 2-bit | control/run byte stream of 2-bit levels | `level * 85` | `(w + 42) / 85` | ±42 |
//!
//! Weights that are multiples of 17 (packed) or of 85 (run-length) survive an
//! encode/decode cycle unchanged.
//!
//! ## Run-length stream
//!
//! Each run starts with a control byte. Bit 7 set means *fill*: the next byte
//! is repeated `control & 0x7F` times. Bit 7 clear means *copy*: the next
//! `control & 0x7F` bytes are taken literally. Only the low two bits of each
//! value byte are significant.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Side length of an alpha raster.
pub const ALPHA_SIDE: usize = 64;

/// Number of cells in an alpha raster.
pub const ALPHA_CELLS: usize = ALPHA_SIDE * ALPHA_SIDE;

/// Size of a packed 4-bit alpha map in bytes.
pub const PACKED_ALPHA_BYTES: usize = ALPHA_CELLS / 2;

const RUN_FILL: u8 = 0x80;
const RUN_COUNT_MASK: u8 = 0x7F;
const MAX_RUN: usize = RUN_COUNT_MASK as usize;
const MIN_FILL_RUN: usize = 3;

/// Physical alpha-map encoding chosen at encode time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlphaFormat {
    /// Two 4-bit weights per byte. Written with the tile big-alpha flag set.
    #[default]
    Packed4Bit,
    /// Run-length compressed 2-bit levels. Written with big-alpha clear.
    RunLength2Bit,
}

impl AlphaFormat {
    /// Selects the decoder for a tile's big-alpha flag.
    pub fn from_big_alpha(big_alpha: bool) -> Self {
        if big_alpha {
            Self::Packed4Bit
        } else {
            Self::RunLength2Bit
        }
    }

    /// Rounds a weight to the nearest value this format can represent.
    pub fn quantize(self, weight: u8) -> u8 {
        match self {
            Self::Packed4Bit => nibble(weight) * 17,
            Self::RunLength2Bit => level(weight) * 85,
        }
    }
}

/// A 64×64 raster of blend weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMap {
    weights: Vec<u8>,
}

impl AlphaMap {
    /// Creates a raster with every cell set to `weight`.
    pub fn filled(weight: u8) -> Self {
        Self {
            weights: vec![weight; ALPHA_CELLS],
        }
    }

    /// Wraps a row-major weight array. Returns `None` unless it holds 4096 cells.
    pub fn from_weights(weights: Vec<u8>) -> Option<Self> {
        (weights.len() == ALPHA_CELLS).then_some(Self { weights })
    }

    /// Row-major weights.
    pub fn weights(&self) -> &[u8] {
        &self.weights
    }

    /// Returns the weight at `(x, y)`, or 0 outside the raster.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= ALPHA_SIDE || y >= ALPHA_SIDE {
            return 0;
        }
        self.weights[y * ALPHA_SIDE + x]
    }

    /// Sets the weight at `(x, y)`. Out-of-range cells are ignored.
    pub fn set(&mut self, x: usize, y: usize, weight: u8) {
        if x >= ALPHA_SIDE || y >= ALPHA_SIDE {
            tracing::warn!("AlphaMap::set out of bounds: ({}, {})", x, y);
            return;
        }
        self.weights[y * ALPHA_SIDE + x] = weight;
    }

    /// Returns the raster a decode of `self.encode(format)` would produce.
    pub fn quantized(&self, format: AlphaFormat) -> Self {
        Self {
            weights: self.weights.iter().map(|&w| format.quantize(w)).collect(),
        }
    }

    /// Decodes an alpha map from the start of `stream`.
    ///
    /// `base` is the absolute offset of `stream[0]` and is used for error
    /// reporting. Bytes after the raster's end are ignored.
    pub fn decode(stream: &[u8], format: AlphaFormat, base: usize) -> Result<Self, DecodeError> {
        let weights = match format {
            AlphaFormat::Packed4Bit => decode_packed(stream, base)?,
            AlphaFormat::RunLength2Bit => decode_run_length(stream, ALPHA_CELLS, base)?,
        };
        Ok(Self { weights })
    }

    /// Encodes the raster in the given format.
    pub fn encode(&self, format: AlphaFormat) -> Vec<u8> {
        match format {
            AlphaFormat::Packed4Bit => encode_packed(&self.weights),
            AlphaFormat::RunLength2Bit => encode_run_length(&self.weights),
        }
    }
}

fn nibble(weight: u8) -> u8 {
    ((u16::from(weight) + 8) / 17) as u8
}

fn level(weight: u8) -> u8 {
    ((u16::from(weight) + 42) / 85) as u8
}

fn decode_packed(stream: &[u8], base: usize) -> Result<Vec<u8>, DecodeError> {
    if stream.len() < PACKED_ALPHA_BYTES {
        return Err(DecodeError::TruncatedBuffer {
            offset: base,
            needed: PACKED_ALPHA_BYTES,
            available: stream.len(),
        });
    }
    let mut weights = Vec::with_capacity(ALPHA_CELLS);
    for &byte in &stream[..PACKED_ALPHA_BYTES] {
        weights.push((byte & 0x0F) * 17);
        weights.push((byte >> 4) * 17);
    }
    Ok(weights)
}

fn encode_packed(weights: &[u8]) -> Vec<u8> {
    weights
        .chunks(2)
        .map(|pair| {
            let lo = nibble(pair[0]);
            let hi = pair.get(1).map_or(0, |&w| nibble(w));
            lo | (hi << 4)
        })
        .collect()
}

/// Decodes a run-length stream into exactly `expected` weights.
pub(crate) fn decode_run_length(
    stream: &[u8],
    expected: usize,
    base: usize,
) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(expected);
    let mut pos = 0;
    while out.len() < expected {
        let Some(&control) = stream.get(pos) else {
            break;
        };
        let count = usize::from(control & RUN_COUNT_MASK);
        if out.len() + count > expected {
            return Err(DecodeError::AlphaStreamOverrun {
                offset: base + pos,
                expected,
            });
        }
        pos += 1;
        if control & RUN_FILL != 0 {
            let Some(&value) = stream.get(pos) else {
                break;
            };
            pos += 1;
            out.extend(std::iter::repeat_n(level_weight(value), count));
        } else {
            let end = (pos + count).min(stream.len());
            out.extend(stream[pos..end].iter().map(|&v| level_weight(v)));
            pos = end;
        }
    }
    if out.len() < expected {
        return Err(DecodeError::AlphaStreamUnderrun {
            offset: base + stream.len(),
            expected,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn level_weight(value: u8) -> u8 {
    (value & 0x03) * 85
}

fn encode_run_length(weights: &[u8]) -> Vec<u8> {
    let levels: Vec<u8> = weights.iter().map(|&w| level(w)).collect();
    let mut out = Vec::new();
    let mut literals: Vec<u8> = Vec::with_capacity(MAX_RUN);
    let mut i = 0;

    while i < levels.len() {
        let value = levels[i];
        let run = levels[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&v| v == value)
            .count();

        if run >= MIN_FILL_RUN {
            flush_literals(&mut out, &mut literals);
            out.push(RUN_FILL | run as u8);
            out.push(value);
            i += run;
        } else {
            literals.push(value);
            if literals.len() == MAX_RUN {
                flush_literals(&mut out, &mut literals);
            }
            i += 1;
        }
    }
    flush_literals(&mut out, &mut literals);
    out
}

fn flush_literals(out: &mut Vec<u8>, literals: &mut Vec<u8>) {
    if literals.is_empty() {
        return;
    }
    out.push(literals.len() as u8);
    out.append(literals);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
