//! Post-processing hook for the mixer callback
//!
//! Runs once per packet on the audio thread:
//! 1. Snapshot preferences
//! 2. Equalise (when enabled)
//! 3. Queue a copy for the visualiser
//! 4. Apply mute

use crate::equaliser::Equaliser;
use crate::error::{AudioError, Result};
use crate::handoff::PacketSender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use waveform_core::{AudioFormat, SampleRate, SharedPreferences, CHANNELS};

/// Shared mute switch
///
/// Muting silences the sink but keeps the visualiser moving.
#[derive(Debug, Clone, Default)]
pub struct MuteHandle {
    muted: Arc<AtomicBool>,
}

impl MuteHandle {
    /// New, unmuted handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Set mute state
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Current mute state
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Flip mute state, returning the new state
    pub fn toggle(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::Relaxed)
    }
}

/// Equaliser, visualiser hand-off and mute for one output stream
#[derive(Debug)]
pub struct AudioPipeline {
    format: AudioFormat,
    equaliser: Equaliser,
    /// Whether the previous packet went through the equaliser
    equaliser_active: bool,
    preferences: SharedPreferences,
    visualiser: PacketSender,
    mute: MuteHandle,
}

impl AudioPipeline {
    /// Pipeline for interleaved stereo packets of `frame_count` frames
    ///
    /// # Errors
    ///
    /// Propagates equaliser construction errors.
    pub fn new(
        frame_count: usize,
        sample_rate: SampleRate,
        preferences: SharedPreferences,
        visualiser: PacketSender,
    ) -> Result<Self> {
        Self::with_format(
            AudioFormat::new(sample_rate, CHANNELS, frame_count),
            preferences,
            visualiser,
        )
    }

    /// Pipeline for an arbitrary packet layout
    ///
    /// # Errors
    ///
    /// Propagates equaliser construction errors.
    pub fn with_format(
        format: AudioFormat,
        preferences: SharedPreferences,
        visualiser: PacketSender,
    ) -> Result<Self> {
        let equaliser = Equaliser::new(format.frame_count, format.channels, format.sample_rate)?;

        info!(
            "Audio pipeline ready: {} Hz, {} channels, {} frames per packet",
            format.sample_rate.as_hz(),
            format.channels,
            format.frame_count
        );

        Ok(Self {
            format,
            equaliser,
            equaliser_active: false,
            preferences,
            visualiser,
            mute: MuteHandle::new(),
        })
    }

    /// Packet layout this pipeline was built for
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Handle for muting from another thread
    pub fn mute_handle(&self) -> MuteHandle {
        self.mute.clone()
    }

    /// The equaliser stage
    pub fn equaliser(&self) -> &Equaliser {
        &self.equaliser
    }

    /// Packets the visualiser hand-off discarded
    pub fn dropped_packets(&self) -> u64 {
        self.visualiser.dropped()
    }

    /// Drop equaliser history, e.g. on a track change or seek
    pub fn reset(&mut self) {
        self.equaliser.reset();
    }

    /// Process one interleaved packet in place
    ///
    /// # Errors
    ///
    /// [`AudioError::PacketShape`] if `samples` does not match the pipeline's
    /// format. The packet is left untouched.
    ///
    /// The preferences snapshot taken here is dropped on return. Publishers
    /// keep the value they replace until their next publish, so that drop
    /// never frees preferences on the audio thread.
    pub fn process(&mut self, samples: &mut [f32]) -> Result<()> {
        let channels = usize::from(self.format.channels);
        if samples.len() != self.format.packet_len() {
            return Err(AudioError::shape(
                self.format.frame_count,
                channels,
                samples.len(),
                channels,
            ));
        }

        let preferences = self.preferences.snapshot();
        let settings = &preferences.equaliser;
        if settings.enabled {
            if !self.equaliser_active {
                self.equaliser.reset();
                self.equaliser_active = true;
            }
            self.equaliser.process(samples, &settings.frequency_ranges)?;
        } else {
            self.equaliser_active = false;
        }

        self.visualiser.send(samples, self.format.channels);

        if self.mute.is_muted() {
            samples.fill(0.0);
        }

        Ok(())
    }
}
