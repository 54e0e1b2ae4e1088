/// Core error types for Waveform
use thiserror::Error;

/// Result type alias using `WaveformError`
pub type Result<T> = std::result::Result<T, WaveformError>;

/// Core error type for Waveform
#[derive(Error, Debug)]
pub enum WaveformError {
    /// Packet data that can never form a valid interleaved packet
    #[error("Invalid audio packet: {0}")]
    InvalidPacket(String),

    /// Packet does not match the shape the stream was opened with
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

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio processing errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl WaveformError {
    /// Create an invalid packet error
    pub fn invalid_packet(msg: impl Into<String>) -> Self {
        Self::InvalidPacket(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }
}

impl From<config::ConfigError> for WaveformError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
