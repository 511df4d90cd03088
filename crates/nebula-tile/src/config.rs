//! Encode-time policy.

use serde::{Deserialize, Serialize};

use crate::alpha::AlphaFormat;
use crate::holes::HoleMask;
use crate::liquid::LiquidFormat;

/// Resolution the encoder writes hole masks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoleResolution {
    /// Keep each chunk's resolution.
    #[default]
    Preserve,
    /// Write every mask as 4×4.
    Low,
    /// Write every mask as 8×8.
    High,
}

impl HoleResolution {
    /// Converts a mask to the configured resolution.
    pub fn apply(self, mask: HoleMask) -> HoleMask {
        match self {
            Self::Preserve => mask,
            Self::Low => mask.to_low_res(),
            Self::High => mask.to_high_res(),
        }
    }
}

/// Choices the encoder makes that are not part of the decoded tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Alpha map encoding. Also decides the tile's big-alpha flag.
    pub alpha_format: AlphaFormat,
    /// Hole mask resolution.
    pub hole_resolution: HoleResolution,
    /// Liquid generation to write.
    pub liquid_format: LiquidFormat,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncodeConfig::default();
        assert_eq!(config.alpha_format, AlphaFormat::Packed4Bit);
        assert_eq!(config.hole_resolution, HoleResolution::Preserve);
        assert_eq!(config.liquid_format, LiquidFormat::Preserve);
    }

    #[test]
    fn test_hole_resolution_apply() {
        let mut mask = HoleMask::empty(false);
        mask.set(0, 0, true);
        assert_eq!(HoleResolution::Preserve.apply(mask), mask);
        assert!(HoleResolution::High.apply(mask).is_high_res());
        assert_eq!(HoleResolution::Low.apply(mask.to_high_res()), mask);
    }
}
