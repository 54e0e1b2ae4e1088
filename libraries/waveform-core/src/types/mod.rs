//! Domain types for the audio post-processing pipeline

mod audio;
mod equaliser;
mod visualiser;

pub use audio::{
    packet_rate, AudioFormat, AudioPacket, SampleRate, AUDIO_FREQUENCY, CHANNELS, PACKET_SIZE,
    TARGET_FPS,
};
pub use equaliser::FrequencyRange;
pub use visualiser::{VisualisationMode, VisualiserConfig};
