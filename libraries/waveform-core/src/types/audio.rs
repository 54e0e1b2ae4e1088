/// Audio stream types
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveformError};

/// Sample rate the mixer is opened with (Hz)
pub const AUDIO_FREQUENCY: u32 = 48_000;

/// Packets delivered per second; also the visualiser redraw target
pub const TARGET_FPS: u32 = 60;

/// Frames per packet (per channel)
pub const PACKET_SIZE: usize = (AUDIO_FREQUENCY / TARGET_FPS) as usize;

/// Interleaved channel count of every packet
pub const CHANNELS: u16 = 2;

/// Approximate packet cadence in packets per second for a given stream shape
pub fn packet_rate(sample_rate: SampleRate, frame_count: usize) -> f32 {
    if frame_count == 0 {
        return 0.0;
    }
    sample_rate.as_hz() as f32 / frame_count as f32
}

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }

    /// Highest representable frequency (half the sample rate)
    pub fn nyquist(&self) -> f32 {
        self.0 as f32 / 2.0
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self(AUDIO_FREQUENCY)
    }
}

/// Shape of the packet stream for one playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate
    pub sample_rate: SampleRate,

    /// Number of interleaved channels
    pub channels: u16,

    /// Frames (samples per channel) in every packet
    pub frame_count: usize,
}

impl AudioFormat {
    /// Create a new audio format
    pub fn new(sample_rate: SampleRate, channels: u16, frame_count: usize) -> Self {
        Self {
            sample_rate,
            channels,
            frame_count,
        }
    }

    /// Total interleaved samples in one packet
    pub fn packet_len(&self) -> usize {
        self.frame_count * self.channels as usize
    }

    /// Duration of one packet in seconds
    pub fn packet_duration_secs(&self) -> f64 {
        self.frame_count as f64 / f64::from(self.sample_rate.as_hz())
    }
}

impl Default for AudioFormat {
    /// The stream the mixer is opened with: 48 kHz stereo, 800 frames per packet
    fn default() -> Self {
        Self {
            sample_rate: SampleRate(AUDIO_FREQUENCY),
            channels: CHANNELS,
            frame_count: PACKET_SIZE,
        }
    }
}

/// One fixed-length chunk of interleaved f32 samples from the mixer callback
///
/// Interleaved format: [L, R, L, R, ...] for stereo. A packet is owned by
/// whichever pipeline stage currently holds it and is moved, never shared,
/// across the audio -> UI hand-off.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPacket {
    samples: Vec<f32>,
    channels: u16,
}

impl AudioPacket {
    /// Wrap interleaved samples
    ///
    /// Rejects a zero channel count, an empty buffer, and a buffer whose length
    /// is not a whole number of frames. Samples are never truncated or padded.
    pub fn new(samples: Vec<f32>, channels: u16) -> Result<Self> {
        if channels == 0 {
            return Err(WaveformError::invalid_packet("channel count must be at least 1"));
        }
        if samples.is_empty() {
            return Err(WaveformError::invalid_packet("packet contains no samples"));
        }
        if samples.len() % channels as usize != 0 {
            return Err(WaveformError::invalid_packet(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }

        Ok(Self { samples, channels })
    }

    /// Create a zeroed packet
    pub fn silent(frame_count: usize, channels: u16) -> Self {
        Self {
            samples: vec![0.0; frame_count * channels as usize],
            channels,
        }
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutable interleaved samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Give the sample buffer back (for reuse)
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Get the number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Get the length in samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the packet is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check whether the packet has the shape of `format`
    pub fn matches(&self, format: &AudioFormat) -> bool {
        self.channels == format.channels && self.frames() == format.frame_count
    }

    /// Fail with `PacketShape` unless the packet has the shape of `format`
    pub fn ensure_shape(&self, format: &AudioFormat) -> Result<()> {
        if self.matches(format) {
            return Ok(());
        }
        Err(WaveformError::PacketShape {
            expected_frames: format.frame_count,
            expected_channels: format.channels as usize,
            frames: self.frames(),
            channels: self.channels as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_size_matches_target_fps() {
        assert_eq!(PACKET_SIZE, 800);
        assert!((packet_rate(SampleRate::default(), PACKET_SIZE) - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn packet_rate_of_empty_stream_is_zero() {
        assert_eq!(packet_rate(SampleRate::default(), 0), 0.0);
    }

    #[test]
    fn nyquist_is_half_sample_rate() {
        assert_eq!(SampleRate::DVD_QUALITY.nyquist(), 24_000.0);
    }

    #[test]
    fn default_format_packet_len() {
        let format = AudioFormat::default();
        assert_eq!(format.packet_len(), 1600);
        assert!((format.packet_duration_secs() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn packet_frames_calculation() {
        // 8 samples with 2 channels = 4 frames
        let packet = AudioPacket::new(vec![0.0; 8], 2).unwrap();
        assert_eq!(packet.frames(), 4);
        assert_eq!(packet.len(), 8);
    }

    #[test]
    fn packet_rejects_partial_frames() {
        let err = AudioPacket::new(vec![0.0; 7], 2).unwrap_err();
        assert!(matches!(err, WaveformError::InvalidPacket(_)));
    }

    #[test]
    fn packet_rejects_zero_channels_and_empty_buffers() {
        assert!(AudioPacket::new(vec![0.0; 4], 0).is_err());
        assert!(AudioPacket::new(Vec::new(), 2).is_err());
    }

    #[test]
    fn ensure_shape_reports_mismatch() {
        let format = AudioFormat::new(SampleRate::DVD_QUALITY, 2, 4);
        let packet = AudioPacket::silent(3, 2);

        match packet.ensure_shape(&format) {
            Err(WaveformError::PacketShape {
                expected_frames,
                frames,
                ..
            }) => {
                assert_eq!(expected_frames, 4);
                assert_eq!(frames, 3);
            }
            other => panic!("expected PacketShape, got {:?}", other),
        }

        assert!(AudioPacket::silent(4, 2).ensure_shape(&format).is_ok());
        assert!(AudioPacket::silent(8, 1).ensure_shape(&format).is_err());
    }
}
