//! User preferences consumed by the equaliser and visualiser
//!
//! Preferences are layered: defaults, then an optional TOML/JSON file, then
//! `WAVEFORM__SECTION__FIELD` environment variables. The core only ever
//! reads them; `SharedPreferences` hands out one immutable snapshot per
//! `process`/`render` call so a concurrent edit can never be observed half
//! applied.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::{Result, WaveformError};
use crate::presets::EqualiserPreset;
use crate::types::{FrequencyRange, SampleRate, VisualiserConfig};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "WAVEFORM";

/// Equaliser section of the preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqualiserSettings {
    /// Whether packets are run through the equaliser at all
    #[serde(default)]
    pub enabled: bool,

    /// Ranges applied in order to every packet
    #[serde(default)]
    pub frequency_ranges: Vec<FrequencyRange>,
}

/// Everything the pipeline reads from the preferences collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Visualiser display settings
    #[serde(default)]
    pub visualiser: VisualiserConfig,

    /// Equaliser toggle and ranges
    #[serde(default)]
    pub equaliser: EqualiserSettings,
}

impl Preferences {
    /// Load preferences from an optional file and the environment
    ///
    /// A path that is given but does not exist is an error; pass `None` to
    /// rely on defaults and environment variables only.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(WaveformError::config(format!(
                    "preferences file {} not found",
                    path.display()
                )));
            }
            debug!("Loading preferences from {}", path.display());
            settings = settings.add_source(config::File::from(path));
        }

        // Override with environment variables (WAVEFORM__VISUALISER__GAP_SIZE=3)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let preferences: Self = settings.build()?.try_deserialize()?;
        preferences.log_problems(SampleRate::default());
        Ok(preferences)
    }

    /// Parse preferences from TOML text
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let preferences: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        preferences.log_problems(SampleRate::default());
        Ok(preferences)
    }

    /// Parse preferences from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize preferences as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace the equaliser ranges with a preset and enable the equaliser
    pub fn apply_preset(&mut self, preset: EqualiserPreset) {
        self.equaliser.frequency_ranges = preset.ranges();
        self.equaliser.enabled = true;
    }

    /// Append a default range row
    pub fn add_frequency_range(&mut self) {
        self.equaliser.frequency_ranges.push(FrequencyRange::new_row());
    }

    /// Replace the range at `index`
    pub fn set_frequency_range(&mut self, index: usize, range: FrequencyRange) -> Result<()> {
        let slot = self
            .equaliser
            .frequency_ranges
            .get_mut(index)
            .ok_or_else(|| {
                WaveformError::invalid_input(format!("no frequency range at index {}", index))
            })?;
        *slot = range;
        Ok(())
    }

    /// Remove every range
    pub fn clear_frequency_ranges(&mut self) {
        self.equaliser.frequency_ranges.clear();
    }

    /// Restore the visualiser section to defaults, leaving the equaliser alone
    pub fn reset_visualiser(&mut self) {
        self.visualiser = VisualiserConfig::default();
    }

    /// All configuration edge cases for a stream at `sample_rate`
    pub fn problems(&self, sample_rate: SampleRate) -> Vec<String> {
        let nyquist = sample_rate.nyquist();
        let mut problems: Vec<String> = self
            .visualiser
            .problems(nyquist)
            .into_iter()
            .map(|problem| format!("visualiser: {}", problem))
            .collect();

        for (index, range) in self.equaliser.frequency_ranges.iter().enumerate() {
            if let Some(problem) = range.problem(nyquist) {
                problems.push(format!("equaliser range {}: {}", index + 1, problem));
            }
        }

        problems
    }

    fn log_problems(&self, sample_rate: SampleRate) {
        for problem in self.problems(sample_rate) {
            warn!("Suspicious preference: {}", problem);
        }
    }
}

/// Preferences shared between the preferences owner and the pipeline threads
///
/// Readers never lock: `snapshot()` is an atomic pointer load, which keeps it
/// usable inside the audio callback.
///
/// Publishing keeps the replaced preferences alive until the next publish, so
/// a reader that drops its snapshot after a swap only decrements a count and
/// the memory is released on the publishing thread.
#[derive(Clone)]
pub struct SharedPreferences {
    inner: Arc<ArcSwap<Preferences>>,
    /// Last replaced value; only touched by `store` and `update`
    retired: Arc<Mutex<Option<Arc<Preferences>>>>,
}

impl SharedPreferences {
    /// Share an initial set of preferences
    pub fn new(preferences: Preferences) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(preferences)),
            retired: Arc::new(Mutex::new(None)),
        }
    }

    /// Current preferences; hold on to the returned value for one call
    pub fn snapshot(&self) -> Arc<Preferences> {
        self.inner.load_full()
    }

    /// Publish a complete new set of preferences
    pub fn store(&self, preferences: Preferences) {
        preferences.log_problems(SampleRate::default());
        let previous = self.inner.swap(Arc::new(preferences));
        self.retire(previous);
    }

    /// Edit a copy of the current preferences and publish it
    pub fn update<F>(&self, mut edit: F)
    where
        F: FnMut(&mut Preferences),
    {
        let previous = self.inner.rcu(|current| {
            let mut next = Preferences::clone(current);
            edit(&mut next);
            next
        });
        self.retire(previous);
        self.snapshot().log_problems(SampleRate::default());
    }

    fn retire(&self, previous: Arc<Preferences>) {
        // The value retired by the publish before this one is dropped here
        let released = match self.retired.lock() {
            Ok(mut slot) => slot.replace(previous),
            Err(poisoned) => poisoned.into_inner().replace(previous),
        };
        drop(released);
    }
}

impl Default for SharedPreferences {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl fmt::Debug for SharedPreferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedPreferences")
            .field(&self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisualisationMode;

    #[test]
    fn default_preferences() {
        let preferences = Preferences::default();
        assert!(!preferences.equaliser.enabled);
        assert!(preferences.equaliser.frequency_ranges.is_empty());
        assert_eq!(preferences.visualiser, VisualiserConfig::default());
        assert!(preferences.problems(SampleRate::default()).is_empty());
    }

    #[test]
    fn apply_preset_enables_equaliser() {
        let mut preferences = Preferences::default();
        preferences.apply_preset(EqualiserPreset::RemoveTreble);
        assert!(preferences.equaliser.enabled);
        assert_eq!(
            preferences.equaliser.frequency_ranges,
            EqualiserPreset::RemoveTreble.ranges()
        );
    }

    #[test]
    fn range_editing() {
        let mut preferences = Preferences::default();
        preferences.add_frequency_range();
        preferences.add_frequency_range();
        preferences
            .set_frequency_range(1, FrequencyRange::new(200.0, 400.0, 2.0))
            .unwrap();

        assert_eq!(preferences.equaliser.frequency_ranges[0], FrequencyRange::new_row());
        assert_eq!(preferences.equaliser.frequency_ranges[1].multiplier, 2.0);
        assert!(preferences
            .set_frequency_range(5, FrequencyRange::new_row())
            .is_err());

        preferences.clear_frequency_ranges();
        assert!(preferences.equaliser.frequency_ranges.is_empty());
    }

    #[test]
    fn reset_visualiser_keeps_equaliser() {
        let mut preferences = Preferences::default();
        preferences.apply_preset(EqualiserPreset::BassBoost);
        preferences.visualiser.gap_size = 12;
        preferences.visualiser.mode = VisualisationMode::TimeDomain;

        preferences.reset_visualiser();

        assert_eq!(preferences.visualiser, VisualiserConfig::default());
        assert!(preferences.equaliser.enabled);
    }

    #[test]
    fn problems_are_labelled() {
        let mut preferences = Preferences::default();
        preferences.equaliser.frequency_ranges = vec![FrequencyRange::new(900.0, 100.0, 0.5)];
        let problems = preferences.problems(SampleRate::default());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("equaliser range 1"));
    }

    #[test]
    fn shared_snapshot_is_stable_across_updates() {
        let shared = SharedPreferences::default();
        let before = shared.snapshot();

        shared.update(|preferences| preferences.apply_preset(EqualiserPreset::RemoveBass));

        assert!(!before.equaliser.enabled);
        assert!(shared.snapshot().equaliser.enabled);
    }

    #[test]
    fn replaced_preferences_outlive_reader_snapshot() {
        let shared = SharedPreferences::default();
        let reader = shared.snapshot();
        assert_eq!(Arc::strong_count(&reader), 2);

        shared.store(Preferences::default());
        // Still held by the publisher, so dropping `reader` cannot free it
        assert_eq!(Arc::strong_count(&reader), 2);

        shared.update(|preferences| preferences.visualiser.gap_size = 7);
        assert_eq!(Arc::strong_count(&reader), 1);
    }

    #[test]
    fn shared_store_replaces_everything() {
        let shared = SharedPreferences::default();
        let mut next = Preferences::default();
        next.visualiser.gap_size = 9;
        shared.store(next.clone());
        assert_eq!(*shared.snapshot(), next);
    }
}
