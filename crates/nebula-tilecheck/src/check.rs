//! Decode, re-encode and compare.

use std::path::PathBuf;

use nebula_config::Config;
use nebula_tile::{
    AlphaFormat, DecodeError, EncodeConfig, EncodeError, HoleResolution, LiquidFormat, Tile,
    decode_tile, encode_tile,
};

use crate::summary::TileSummary;

/// Errors that can occur while checking a tile.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Failed to read the input tile.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the re-encoded tile.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input (or a re-encoded copy) did not decode.
    #[error("decode failed at byte {offset}: {source}", offset = .0.offset(), source = .0)]
    Decode(#[from] DecodeError),

    /// The decoded tile could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// A re-encoded tile decoded to something else.
    #[error("round trip changed the tile: {0}")]
    Mismatch(String),
}

/// Result of a successful check.
#[derive(Debug)]
pub struct CheckReport {
    pub summary: TileSummary,
    /// The tile re-encoded under the configured policy.
    pub encoded: Vec<u8>,
    /// Whether the round trip was verified.
    pub verified: bool,
}

/// Decodes `bytes`, re-encodes the tile under `config.encode` and, unless
/// disabled, verifies the result.
///
/// Re-encoding must be stable: decoding the re-encoded tile and encoding it
/// again yields the same tile. When the policy keeps the tile's own formats,
/// the first re-encode must also reproduce the input tile exactly.
pub fn check_tile(bytes: &[u8], config: &Config) -> Result<CheckReport, CheckError> {
    let first = decode_tile(bytes)?;
    let summary = TileSummary::new(&first, bytes.len(), config.check.list_chunks);
    let encoded = encode_tile(&first, &config.encode)?;

    if !config.check.verify_roundtrip {
        return Ok(CheckReport {
            summary,
            encoded,
            verified: false,
        });
    }

    let second = decode_tile(&encoded)?;
    if keeps_formats(&first, &config.encode) {
        compare(&first, &second)?;
    }
    let third = decode_tile(&encode_tile(&second, &config.encode)?)?;
    compare(&second, &third)?;

    tracing::info!(
        "Round trip verified: {} bytes in, {} bytes out",
        bytes.len(),
        encoded.len()
    );
    Ok(CheckReport {
        summary,
        encoded,
        verified: true,
    })
}

/// Whether encoding `tile` under `encode` leaves its formats as they are.
fn keeps_formats(tile: &Tile, encode: &EncodeConfig) -> bool {
    encode.alpha_format == AlphaFormat::from_big_alpha(tile.flags.big_alpha)
        && encode.hole_resolution == HoleResolution::Preserve
        && encode.liquid_format == LiquidFormat::Preserve
}

fn compare(expected: &Tile, actual: &Tile) -> Result<(), CheckError> {
    if expected == actual {
        return Ok(());
    }
    let what = if expected.flags != actual.flags {
        "tile flags".to_string()
    } else if expected.flight_bounds != actual.flight_bounds {
        "flight bounds".to_string()
    } else if expected.names != actual.names || expected.texture_flags != actual.texture_flags {
        "name tables".to_string()
    } else if expected.doodads != actual.doodads || expected.objects != actual.objects {
        "placements".to_string()
    } else {
        match expected.chunks.iter().zip(&actual.chunks).position(|(a, b)| a != b) {
            Some(slot) => format!("chunk {slot}"),
            None => "chunk count".to_string(),
        }
    };
    Err(CheckError::Mismatch(what))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_tile::{AlphaMap, LiquidBlock, LiquidLayer, ModernLiquid, TextureLayer};

    fn sample_bytes() -> Vec<u8> {
        let mut tile = Tile::new();
        tile.names.textures = vec!["a.blp".into(), "b.blp".into()];
        tile.chunks[4].layers = vec![
            TextureLayer::base(0),
            TextureLayer::blended(1, AlphaMap::filled(100)),
        ];
        tile.chunks[4].holes.set(2, 2, true);
        tile.chunks[9].liquid = Some(LiquidBlock::Modern(ModernLiquid::with_layer(
            LiquidLayer::new(1, 0.0, 2.0),
        )));
        encode_tile(&tile, &EncodeConfig::default()).unwrap()
    }

    #[test]
    fn test_check_verifies_roundtrip() {
        let bytes = sample_bytes();
        let report = check_tile(&bytes, &Config::default()).unwrap();
        assert!(report.verified);
        assert_eq!(report.encoded, bytes);
        assert_eq!(report.summary.modern_liquid_chunks, 1);
    }

    #[test]
    fn test_check_with_converting_policy() {
        let mut config = Config::default();
        config.encode.alpha_format = AlphaFormat::RunLength2Bit;
        config.encode.liquid_format = LiquidFormat::Legacy;
        config.encode.hole_resolution = HoleResolution::High;
        let report = check_tile(&sample_bytes(), &config).unwrap();
        assert!(report.verified);

        let decoded = decode_tile(&report.encoded).unwrap();
        assert!(!decoded.flags.big_alpha);
        assert!(decoded.chunks[4].holes.is_high_res());
        assert!(matches!(decoded.chunks[9].liquid, Some(LiquidBlock::Legacy(_))));
    }

    #[test]
    fn test_check_skips_verification() {
        let mut config = Config::default();
        config.check.verify_roundtrip = false;
        let report = check_tile(&sample_bytes(), &config).unwrap();
        assert!(!report.verified);
    }

    #[test]
    fn test_check_reports_decode_offset() {
        let mut bytes = sample_bytes();
        bytes[0] = 0;
        let err = check_tile(&bytes, &Config::default()).unwrap_err();
        assert!(matches!(err, CheckError::Decode(DecodeError::InvalidMagic)));
        assert_eq!(err.to_string(), "decode failed at byte 0: invalid tile magic");
    }

    #[test]
    fn test_compare_names_first_difference() {
        let a = Tile::new();
        let mut b = Tile::new();
        b.chunks[37].area_id = 5;
        let err = compare(&a, &b).unwrap_err();
        assert_eq!(err.to_string(), "round trip changed the tile: chunk 37");

        b.flight_bounds = Some(nebula_tile::FlightBounds::flat(100, 0));
        let err = compare(&a, &b).unwrap_err();
        assert_eq!(err.to_string(), "round trip changed the tile: flight bounds");
    }
}
