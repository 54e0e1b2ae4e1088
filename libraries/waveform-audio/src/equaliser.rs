//! Overlapped FFT graphic equaliser
//!
//! Each packet is corrected in the frequency domain with one packet of past
//! and one packet of future context. The transform window for packet `N` is
//! the concatenation `[N-2, N-1, N]` per channel; after scaling the configured
//! bins the middle third (packet `N-1`) is emitted. Output therefore trails
//! input by two packet periods, and the first two packets of a stream come
//! back silent while the history fills.
//!
//! # Example
//!
//! ```rust
//! use waveform_audio::Equaliser;
//! use waveform_core::{FrequencyRange, SampleRate};
//!
//! let mut eq = Equaliser::new(800, 2, SampleRate::DVD_QUALITY).unwrap();
//! let ranges = [FrequencyRange::new(0.0, 1000.0, 0.05)];
//!
//! let mut packet = vec![0.25; 1600];
//! eq.process(&mut packet, &ranges).unwrap();
//! assert!(packet.iter().all(|&s| s == 0.0)); // warm-up
//! ```

use crate::error::{AudioError, Result};
use crate::spectrum::{equaliser_bins, scale_magnitude};
use crate::MAX_CHANNELS;
use realfft::num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;
use waveform_core::{AudioPacket, FrequencyRange, SampleRate};

/// Packets in one transform window
const WINDOW_PACKETS: usize = 3;

/// Packets held back between calls
const HISTORY_PACKETS: usize = WINDOW_PACKETS - 1;

/// Per-stream equaliser state
///
/// All buffers are sized in [`Equaliser::new`]; `process` does not allocate.
pub struct Equaliser {
    frame_count: usize,
    channels: usize,
    sample_rate: SampleRate,

    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,

    /// Planar raw history, `HISTORY_PACKETS * frame_count` samples per channel
    history: Vec<f32>,
    /// Packets captured so far, saturating at `HISTORY_PACKETS`
    captured: usize,

    window: Vec<f32>,
    spectrum: Vec<Complex32>,
    output: Vec<f32>,
    forward_scratch: Vec<Complex32>,
    inverse_scratch: Vec<Complex32>,
}

impl Equaliser {
    /// Build an equaliser for packets of `frame_count` interleaved frames
    ///
    /// # Errors
    ///
    /// `frame_count` of zero, a channel count of zero or above
    /// [`MAX_CHANNELS`], or a zero sample rate.
    pub fn new(frame_count: usize, channels: u16, sample_rate: SampleRate) -> Result<Self> {
        if frame_count == 0 {
            return Err(AudioError::InvalidFrameCount(frame_count));
        }
        if channels == 0 || usize::from(channels) > MAX_CHANNELS {
            return Err(AudioError::UnsupportedChannels(channels));
        }
        if sample_rate.as_hz() == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate.as_hz()));
        }

        let fft_len = WINDOW_PACKETS * frame_count;
        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let channels = usize::from(channels);
        let window = forward.make_input_vec();
        let spectrum = forward.make_output_vec();
        let forward_scratch = forward.make_scratch_vec();
        let inverse_scratch = inverse.make_scratch_vec();
        let output = inverse.make_output_vec();

        tracing::debug!(
            frame_count,
            channels,
            sample_rate = sample_rate.as_hz(),
            fft_len,
            "Equaliser initialised"
        );

        Ok(Self {
            frame_count,
            channels,
            sample_rate,
            forward,
            inverse,
            history: vec![0.0; channels * HISTORY_PACKETS * frame_count],
            captured: 0,
            window,
            spectrum,
            output,
            forward_scratch,
            inverse_scratch,
        })
    }

    /// Frames per packet
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Interleaved channels per packet
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Stream sample rate
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Transform length (three packets)
    pub fn fft_len(&self) -> usize {
        WINDOW_PACKETS * self.frame_count
    }

    /// Delay between a frame entering and the same frame leaving, in frames
    pub fn latency_frames(&self) -> usize {
        HISTORY_PACKETS * self.frame_count
    }

    /// True once enough history exists to emit real audio
    pub fn is_warmed_up(&self) -> bool {
        self.captured >= HISTORY_PACKETS
    }

    /// Forget all history; the next two packets come back silent again
    ///
    /// Use on track changes and seeks so unrelated audio is not spliced.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.captured = 0;
    }

    /// Equalise one packet of interleaved samples in place
    ///
    /// `ranges` are applied in order; overlapping ranges compound. With no
    /// ranges (or only unity multipliers) the delayed packet is passed through
    /// unchanged.
    ///
    /// # Errors
    ///
    /// [`AudioError::PacketShape`] if `samples` is not exactly
    /// `frame_count * channels` long. The packet is left untouched.
    pub fn process(&mut self, samples: &mut [f32], ranges: &[FrequencyRange]) -> Result<()> {
        let expected = self.frame_count * self.channels;
        if samples.len() != expected {
            return Err(AudioError::shape(
                self.frame_count,
                self.channels,
                samples.len(),
                self.channels,
            ));
        }

        if !self.is_warmed_up() {
            self.capture(samples);
            samples.fill(0.0);
            return Ok(());
        }

        let passthrough = ranges.iter().all(FrequencyRange::is_identity);
        let n = self.frame_count;
        for channel in 0..self.channels {
            self.load_window(samples, channel);
            let (middle, scale) = if passthrough {
                (&self.window[n..2 * n], 1.0)
            } else {
                self.filter_window(ranges)?;
                (&self.output[n..2 * n], 1.0 / self.fft_len() as f32)
            };
            for (frame, &value) in middle.iter().enumerate() {
                samples[frame * self.channels + channel] = value * scale;
            }
        }

        Ok(())
    }

    /// Equalise an [`AudioPacket`], checking its channel count as well as its length
    ///
    /// # Errors
    ///
    /// [`AudioError::PacketShape`] if the packet was built for another layout.
    pub fn process_packet(
        &mut self,
        packet: &mut AudioPacket,
        ranges: &[FrequencyRange],
    ) -> Result<()> {
        if usize::from(packet.channels()) != self.channels {
            return Err(AudioError::shape(
                self.frame_count,
                self.channels,
                packet.len(),
                usize::from(packet.channels()),
            ));
        }
        self.process(packet.samples_mut(), ranges)
    }

    /// Store a warm-up packet in the next free history slot
    fn capture(&mut self, samples: &[f32]) {
        let n = self.frame_count;
        let span = HISTORY_PACKETS * n;
        let offset = self.captured * n;
        for channel in 0..self.channels {
            let slot = &mut self.history[channel * span + offset..channel * span + offset + n];
            for (frame, out) in slot.iter_mut().enumerate() {
                *out = samples[frame * self.channels + channel];
            }
        }
        self.captured += 1;
    }

    /// Build `[N-2, N-1, N]` for one channel and shift that channel's history
    fn load_window(&mut self, samples: &[f32], channel: usize) {
        let n = self.frame_count;
        let span = HISTORY_PACKETS * n;
        let history = &mut self.history[channel * span..(channel + 1) * span];

        self.window[..span].copy_from_slice(history);
        for (frame, out) in self.window[span..].iter_mut().enumerate() {
            *out = samples[frame * self.channels + channel];
        }
        history.copy_from_slice(&self.window[n..]);
    }

    /// Forward transform, range scaling and inverse transform of `window` into `output`
    fn filter_window(&mut self, ranges: &[FrequencyRange]) -> Result<()> {
        self.forward.process_with_scratch(
            &mut self.window,
            &mut self.spectrum,
            &mut self.forward_scratch,
        )?;

        let sample_rate = self.sample_rate.as_hz() as f32;
        let fft_len = WINDOW_PACKETS * self.frame_count;
        let last_bin = self.spectrum.len() - 1;
        for range in ranges {
            if !range.multiplier.is_finite() {
                continue;
            }
            let Some(bins) = equaliser_bins(range.minimum, range.maximum, sample_rate, fft_len)
            else {
                continue;
            };
            let (lower, upper) = (*bins.start(), (*bins.end()).min(last_bin));
            if lower > upper {
                continue;
            }
            for bin in &mut self.spectrum[lower..=upper] {
                *bin = scale_magnitude(*bin, range.multiplier);
            }
        }

        // A real signal has purely real DC and Nyquist bins
        self.spectrum[0].im = 0.0;
        if fft_len % 2 == 0 {
            self.spectrum[last_bin].im = 0.0;
        }

        self.inverse.process_with_scratch(
            &mut self.spectrum,
            &mut self.output,
            &mut self.inverse_scratch,
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for Equaliser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Equaliser")
            .field("frame_count", &self.frame_count)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("warmed_up", &self.is_warmed_up())
            .finish_non_exhaustive()
    }
}
