//! Command-line argument parsing for the tile checker.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use nebula_tile::{AlphaFormat, HoleResolution, LiquidFormat};

use crate::Config;

/// Alpha map encoding selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaArg {
    /// Packed 4-bit weights.
    Packed,
    /// Run-length compressed 2-bit levels.
    RunLength,
}

/// Hole mask resolution selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HolesArg {
    Preserve,
    Low,
    High,
}

/// Liquid generation selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiquidArg {
    Preserve,
    Modern,
    Legacy,
}

impl From<AlphaArg> for AlphaFormat {
    fn from(arg: AlphaArg) -> Self {
        match arg {
            AlphaArg::Packed => Self::Packed4Bit,
            AlphaArg::RunLength => Self::RunLength2Bit,
        }
    }
}

impl From<HolesArg> for HoleResolution {
    fn from(arg: HolesArg) -> Self {
        match arg {
            HolesArg::Preserve => Self::Preserve,
            HolesArg::Low => Self::Low,
            HolesArg::High => Self::High,
        }
    }
}

impl From<LiquidArg> for LiquidFormat {
    fn from(arg: LiquidArg) -> Self {
        match arg {
            LiquidArg::Preserve => Self::Preserve,
            LiquidArg::Modern => Self::Modern,
            LiquidArg::Legacy => Self::Legacy,
        }
    }
}

/// Tile checker command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "nebula-tilecheck", about = "Decode, summarize and re-encode map tiles")]
pub struct CliArgs {
    /// Tile file to read.
    pub input: PathBuf,

    /// Write the re-encoded tile here.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Alpha map encoding for the re-encode.
    #[arg(long, value_enum)]
    pub alpha_format: Option<AlphaArg>,

    /// Hole mask resolution for the re-encode.
    #[arg(long, value_enum)]
    pub holes: Option<HolesArg>,

    /// Liquid generation for the re-encode.
    #[arg(long, value_enum)]
    pub liquid: Option<LiquidArg>,

    /// Skip the decode/encode/decode comparison.
    #[arg(long)]
    pub no_verify: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(alpha) = args.alpha_format {
            self.encode.alpha_format = alpha.into();
        }
        if let Some(holes) = args.holes {
            self.encode.hole_resolution = holes.into();
        }
        if let Some(liquid) = args.liquid {
            self.encode.liquid_format = liquid.into();
        }
        if args.no_verify {
            self.check.verify_roundtrip = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from([
            "nebula-tilecheck",
            "map_32_48.tile",
            "--alpha-format",
            "run-length",
            "--liquid",
            "legacy",
            "--no-verify",
        ]);
        config.apply_cli_overrides(&args);
        assert_eq!(args.input, PathBuf::from("map_32_48.tile"));
        assert_eq!(config.encode.alpha_format, AlphaFormat::RunLength2Bit);
        assert_eq!(config.encode.liquid_format, LiquidFormat::Legacy);
        assert!(!config.check.verify_roundtrip);
        // Non-overridden fields retain defaults
        assert_eq!(config.encode.hole_resolution, HoleResolution::Preserve);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        let args = CliArgs::parse_from(["nebula-tilecheck", "a.tile"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config, original);
        assert!(args.output.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_cli_rejects_unknown_value() {
        let result = CliArgs::try_parse_from(["nebula-tilecheck", "a.tile", "--holes", "medium"]);
        assert!(result.is_err());
    }
}
