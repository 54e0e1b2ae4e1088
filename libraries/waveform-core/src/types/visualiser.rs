//! Visualiser display settings

use serde::{Deserialize, Serialize};

/// What the visualiser bars represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualisationMode {
    /// Bars follow FFT magnitude across a frequency band
    #[default]
    FrequencyDomain,

    /// Bars follow averaged absolute sample amplitude
    TimeDomain,
}

/// Settings read by `VisualiserContext::render` once per redraw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualiserConfig {
    /// Time or frequency display
    #[serde(default)]
    pub mode: VisualisationMode,

    /// Horizontal pixels between consecutive bars
    #[serde(default = "default_gap_size")]
    pub gap_size: u32,

    /// Lowest displayed frequency (Hz)
    #[serde(default = "default_minimum_frequency")]
    pub minimum_frequency: f32,

    /// Highest displayed frequency (Hz)
    #[serde(default = "default_maximum_frequency")]
    pub maximum_frequency: f32,

    /// Space bars evenly on the Bark scale instead of in Hertz
    #[serde(default = "default_true")]
    pub use_bark_scale: bool,

    /// Fade bar colour towards the background at both edges
    #[serde(default = "default_true")]
    pub fade_edges: bool,

    /// Offset added to the magnitude before logarithmic compression
    #[serde(default = "default_gain")]
    pub gain: f32,

    /// Draw nothing for Bark bars that collapse onto a single FFT bin
    ///
    /// At low frequencies several neighbouring bars can land on the same bin
    /// and render as a flat block.
    #[serde(default = "default_true")]
    pub hide_collapsed_bars: bool,

    /// Scale FFT magnitudes by `2 / frame_count` before compression
    ///
    /// With this set a full-scale sine landing on one bin reads as magnitude
    /// 1.0 whatever the packet length. Unset, bars follow the raw bin
    /// magnitude, which grows with the packet length and saturates quickly.
    #[serde(default = "default_true")]
    pub normalise_magnitudes: bool,
}

impl VisualiserConfig {
    /// Set gain from the legacy integer setting, stored in tenths
    #[must_use]
    pub fn with_gain_tenths(mut self, tenths: i32) -> Self {
        self.gain = tenths as f32 / 10.0;
        self
    }

    /// Describe each suspicious setting; used for load-time diagnostics
    pub fn problems(&self, nyquist: f32) -> Vec<String> {
        let mut problems = Vec::new();
        if self.gap_size == 0 {
            problems.push("gap_size 0 is treated as 1".to_string());
        }
        if self.minimum_frequency >= self.maximum_frequency {
            problems.push(format!(
                "minimum_frequency {} Hz is not below maximum_frequency {} Hz",
                self.minimum_frequency, self.maximum_frequency
            ));
        }
        if self.minimum_frequency < 0.0 || self.maximum_frequency > nyquist {
            problems.push(format!(
                "frequency bounds {}-{} Hz extend outside 0-{} Hz; bins will be clamped",
                self.minimum_frequency, self.maximum_frequency, nyquist
            ));
        }
        if self.gain <= 0.0 {
            problems.push(format!(
                "gain {} makes quiet bars negative; they are drawn at zero height",
                self.gain
            ));
        }
        problems
    }
}

impl Default for VisualiserConfig {
    fn default() -> Self {
        Self {
            mode: VisualisationMode::default(),
            gap_size: default_gap_size(),
            minimum_frequency: default_minimum_frequency(),
            maximum_frequency: default_maximum_frequency(),
            use_bark_scale: true,
            fade_edges: true,
            gain: default_gain(),
            hide_collapsed_bars: true,
            normalise_magnitudes: true,
        }
    }
}

fn default_gap_size() -> u32 {
    5
}

fn default_minimum_frequency() -> f32 {
    20.0
}

fn default_maximum_frequency() -> f32 {
    20_000.0
}

fn default_gain() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}
