/// Audio pipeline errors
use thiserror::Error;
use waveform_core::WaveformError;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio pipeline error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// Packet does not have the shape the stage was built for
    ///
    /// This is a broken producer contract: the stream must use one packet
    /// shape for its whole lifetime.
    #[error(
        "Packet shape mismatch: expected {expected_frames} frames x {expected_channels} channels, \
         got {frames} frames x {channels} channels"
    )]
    PacketShape {
        /// Frames per packet the stream was opened with
        expected_frames: usize,
        /// Channels per frame the stream was opened with
        expected_channels: usize,
        /// Frames in the rejected packet
        frames: usize,
        /// Channels in the rejected packet
        channels: usize,
    },

    /// Channel count outside what the stages are built for
    #[error("Unsupported channel count: {0} (expected 1 to {max})", max = crate::MAX_CHANNELS)]
    UnsupportedChannels(u16),

    /// Stage constructed for packets with no frames
    #[error("Invalid frame count: {0}")]
    InvalidFrameCount(usize),

    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// FFT planning or execution failure
    #[error("FFT error: {0}")]
    Fft(String),

    /// Core error
    #[error(transparent)]
    Core(#[from] WaveformError),
}

impl AudioError {
    pub(crate) fn shape(
        expected_frames: usize,
        expected_channels: usize,
        len: usize,
        channels: usize,
    ) -> Self {
        Self::PacketShape {
            expected_frames,
            expected_channels,
            frames: if channels == 0 { 0 } else { len / channels },
            channels,
        }
    }
}

impl From<realfft::FftError> for AudioError {
    fn from(err: realfft::FftError) -> Self {
        Self::Fft(err.to_string())
    }
}

impl From<AudioError> for WaveformError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Core(inner) => inner,
            AudioError::PacketShape {
                expected_frames,
                expected_channels,
                frames,
                channels,
            } => WaveformError::PacketShape {
                expected_frames,
                expected_channels,
                frames,
                channels,
            },
            other => WaveformError::audio(other.to_string()),
        }
    }
}
