//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use nebula_tile::EncodeConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "nebula-tile";
const CONFIG_FILE: &str = "config.ron";

/// Top-level tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Policy used when re-encoding tiles.
    pub encode: EncodeConfig,
    /// Tile check settings.
    pub check: CheckConfig,
    /// Logging settings.
    pub debug: DebugConfig,
}

/// What `nebula-tilecheck` does after decoding a tile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckConfig {
    /// Re-encode the tile and compare a second decode with the first.
    pub verify_roundtrip: bool,
    /// List every chunk in the summary instead of only the totals.
    pub list_chunks: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g., "debug", "info,nebula_tile=trace").
    pub log_level: String,
    /// Also write a JSON log file next to the config.
    pub log_to_file: bool,
}

// --- Default implementations ---

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            verify_roundtrip: true,
            list_chunks: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

// --- Load / Save ---

impl Config {
    /// Platform config directory for the tile tools.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(APP_NAME))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_tile::{AlphaFormat, HoleResolution, LiquidFormat};

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("alpha_format: Packed4Bit"));
        assert!(ron_str.contains("liquid_format: Preserve"));
        assert!(ron_str.contains("verify_roundtrip: true"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.encode.alpha_format = AlphaFormat::RunLength2Bit;
        config.encode.hole_resolution = HoleResolution::High;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let ron_str = "(encode: (liquid_format: Legacy))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.encode.liquid_format, LiquidFormat::Legacy);
        assert_eq!(config.encode.alpha_format, AlphaFormat::Packed4Bit);
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.encode.liquid_format = LiquidFormat::Modern;
        config.check.list_chunks = true;
        config.debug.log_level = "debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
