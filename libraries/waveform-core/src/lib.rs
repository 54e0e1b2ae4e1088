//! Waveform Core
//!
//! Platform-agnostic types, preferences and error handling shared by the
//! Waveform audio post-processing pipeline.
//!
//! The core crate defines:
//! - **Stream types**: `AudioPacket`, `AudioFormat`, `SampleRate` and the fixed
//!   stream constants the mixer is opened with
//! - **Equaliser settings**: `FrequencyRange` and the factory `EqualiserPreset`s
//! - **Visualiser settings**: `VisualiserConfig`, `VisualisationMode`
//! - **Preferences**: layered loading (file + environment) and a lock-free
//!   `SharedPreferences` snapshot for the audio thread
//! - **Error Handling**: Unified `WaveformError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use waveform_core::{AudioPacket, EqualiserPreset, Preferences, SharedPreferences};
//!
//! let mut preferences = Preferences::default();
//! preferences.apply_preset(EqualiserPreset::RemoveBass);
//! let shared = SharedPreferences::new(preferences);
//!
//! // Audio thread: one snapshot per packet
//! let snapshot = shared.snapshot();
//! assert!(snapshot.equaliser.enabled);
//!
//! let packet = AudioPacket::silent(800, 2);
//! assert_eq!(packet.len(), 1600);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod preferences;
pub mod presets;
pub mod types;

pub use error::{Result, WaveformError};
pub use preferences::{EqualiserSettings, Preferences, SharedPreferences};
pub use presets::EqualiserPreset;
pub use types::{
    packet_rate, AudioFormat, AudioPacket, FrequencyRange, SampleRate, VisualisationMode,
    VisualiserConfig, AUDIO_FREQUENCY, CHANNELS, PACKET_SIZE, TARGET_FPS,
};
