//! Factory equaliser presets
//!
//! Each preset replaces the configured frequency ranges wholesale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WaveformError;
use crate::types::FrequencyRange;

/// Equaliser preset offered in the presets menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualiserPreset {
    /// Attenuate everything above 500 Hz, leaving the bass on top
    BassBoost,

    /// Cut below 1 kHz
    RemoveBass,

    /// Cut above 6 kHz
    RemoveTreble,

    /// Cut both ends, like a small laptop speaker
    LowQualitySpeakers,
}

impl EqualiserPreset {
    /// Every preset, in menu order
    pub const ALL: [Self; 4] = [
        Self::BassBoost,
        Self::RemoveBass,
        Self::RemoveTreble,
        Self::LowQualitySpeakers,
    ];

    /// Frequency ranges this preset installs
    pub fn ranges(&self) -> Vec<FrequencyRange> {
        match self {
            Self::BassBoost => vec![FrequencyRange::new(500.0, 24_000.0, 0.1)],
            Self::RemoveBass => vec![FrequencyRange::new(0.0, 1000.0, 0.05)],
            Self::RemoveTreble => vec![FrequencyRange::new(6000.0, 24_000.0, 0.05)],
            Self::LowQualitySpeakers => vec![
                FrequencyRange::new(0.0, 1000.0, 0.05),
                FrequencyRange::new(5000.0, 24_000.0, 0.05),
            ],
        }
    }

    /// Get preset name
    pub fn name(&self) -> &'static str {
        match self {
            Self::BassBoost => "Bass Boost",
            Self::RemoveBass => "Remove Bass",
            Self::RemoveTreble => "Remove Treble",
            Self::LowQualitySpeakers => "Low Quality Speakers",
        }
    }

    /// Stable identifier used on the command line and in settings files
    pub fn id(&self) -> &'static str {
        match self {
            Self::BassBoost => "bass-boost",
            Self::RemoveBass => "remove-bass",
            Self::RemoveTreble => "remove-treble",
            Self::LowQualitySpeakers => "low-quality-speakers",
        }
    }
}

impl fmt::Display for EqualiserPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EqualiserPreset {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|preset| preset.id() == wanted)
            .ok_or_else(|| WaveformError::invalid_input(format!("unknown preset {}", s)))
    }
}
