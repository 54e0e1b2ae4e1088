//! Equaliser frequency ranges

use serde::{Deserialize, Serialize};

/// Scale the magnitude of every spectral bin between `minimum` and `maximum` Hz by `multiplier`
///
/// Ranges may overlap. They are applied in sequence order, so overlapping
/// multipliers compound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    /// Lower bound in Hz
    pub minimum: f32,

    /// Upper bound in Hz
    pub maximum: f32,

    /// Magnitude multiplier (1.0 = unchanged, 0.0 = removed)
    pub multiplier: f32,
}

impl FrequencyRange {
    /// Create a new frequency range
    pub fn new(minimum: f32, maximum: f32, multiplier: f32) -> Self {
        Self {
            minimum,
            maximum,
            multiplier,
        }
    }

    /// Range a freshly added UI row starts with
    pub fn new_row() -> Self {
        Self::new(0.0, 1000.0, 0.05)
    }

    /// True if applying this range leaves the spectrum unchanged
    pub fn is_identity(&self) -> bool {
        (self.multiplier - 1.0).abs() < f32::EPSILON
    }

    /// Describe what is wrong with this range for a stream with the given Nyquist
    /// frequency, or `None` if it is well-formed
    ///
    /// Problems are never fatal: the equaliser clamps bins to the spectrum.
    pub fn problem(&self, nyquist: f32) -> Option<String> {
        if !self.minimum.is_finite() || !self.maximum.is_finite() || !self.multiplier.is_finite() {
            return Some("range contains a non-finite value".to_string());
        }
        if self.minimum > self.maximum {
            return Some(format!(
                "minimum {} Hz is above maximum {} Hz; range has no effect",
                self.minimum, self.maximum
            ));
        }
        if self.minimum < 0.0 || self.maximum > nyquist {
            return Some(format!(
                "{}-{} Hz extends outside 0-{} Hz; bins will be clamped",
                self.minimum, self.maximum, nyquist
            ));
        }
        if self.multiplier < 0.0 {
            return Some(format!(
                "negative multiplier {} inverts phase",
                self.multiplier
            ));
        }
        None
    }
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self::new_row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_row_matches_ui_default() {
        let range = FrequencyRange::default();
        assert_eq!(range.minimum, 0.0);
        assert_eq!(range.maximum, 1000.0);
        assert_eq!(range.multiplier, 0.05);
        assert!(!range.is_identity());
    }

    #[test]
    fn unity_multiplier_is_identity() {
        assert!(FrequencyRange::new(100.0, 200.0, 1.0).is_identity());
    }

    #[test]
    fn problem_detection() {
        let nyquist = 24_000.0;
        assert!(FrequencyRange::new(0.0, 24_000.0, 0.5).problem(nyquist).is_none());
        assert!(FrequencyRange::new(500.0, 100.0, 0.5).problem(nyquist).is_some());
        assert!(FrequencyRange::new(-10.0, 100.0, 0.5).problem(nyquist).is_some());
        assert!(FrequencyRange::new(0.0, 30_000.0, 0.5).problem(nyquist).is_some());
        assert!(FrequencyRange::new(0.0, 100.0, -1.0).problem(nyquist).is_some());
        assert!(FrequencyRange::new(f32::NAN, 100.0, 1.0).problem(nyquist).is_some());
    }
}
