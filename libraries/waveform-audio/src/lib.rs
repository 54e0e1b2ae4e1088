//! Waveform Audio
//!
//! Real-time post-processing for the Waveform player's output stream.
//!
//! This crate provides:
//! - An overlapped FFT graphic equaliser ([`Equaliser`])
//! - A spectrum/waveform bar visualiser ([`VisualiserContext`])
//! - Bark scale and FFT bin helpers ([`spectrum`])
//! - A non-blocking audio -> UI packet hand-off ([`packet_channel`])
//! - The mixer callback hook that chains them ([`AudioPipeline`])
//!
//! # Example
//!
//! ```rust
//! use waveform_audio::{packet_channel, AudioPipeline, VisualiserContext};
//! use waveform_core::{EqualiserPreset, Preferences, SampleRate, SharedPreferences};
//!
//! let mut preferences = Preferences::default();
//! preferences.apply_preset(EqualiserPreset::RemoveTreble);
//! let shared = SharedPreferences::new(preferences);
//!
//! let (tx, rx) = packet_channel(8);
//! let mut pipeline = AudioPipeline::new(800, SampleRate::DVD_QUALITY, shared.clone(), tx).unwrap();
//! let mut visualiser = VisualiserContext::new(800, SampleRate::DVD_QUALITY).unwrap();
//!
//! // Audio thread
//! let mut packet = vec![0.1; 1600];
//! pipeline.process(&mut packet).unwrap();
//!
//! // UI thread
//! rx.drain_into(&mut visualiser);
//! let bars = visualiser.render(640, 120, &shared.snapshot().visualiser);
//! assert_eq!(bars.len(), 128);
//! ```

#![forbid(unsafe_code)]

pub mod equaliser;
pub mod error;
pub mod handoff;
pub mod pipeline;
pub mod spectrum;
pub mod visualiser;

/// Most interleaved channels a stage accepts
pub const MAX_CHANNELS: usize = 8;

pub use equaliser::Equaliser;
pub use error::{AudioError, Result};
pub use handoff::{packet_channel, PacketReceiver, PacketSender, DEFAULT_HANDOFF_CAPACITY};
pub use pipeline::{AudioPipeline, MuteHandle};
pub use spectrum::{bark_to_hertz, hertz_to_bark};
pub use visualiser::{
    fade_weight, Bar, BarPalette, Rgba, VisualiserContext, VISUALISER_RING_DEPTH,
};
