//! Spectrum and waveform visualiser
//!
//! `VisualiserContext` keeps the last [`VISUALISER_RING_DEPTH`] post-equaliser
//! packets, downmixed to mono, together with their magnitude spectra.
//! `accumulate` is driven at packet cadence from the hand-off drain;
//! `render` is called once per redraw and turns the ring into bars.
//!
//! Both run on the UI thread, so the context needs no locking.
//!
//! # Display modes
//!
//! - **Time domain**: bar height is the mean absolute amplitude at the
//!   matching sample index, averaged over every populated ring slot
//! - **Frequency domain**: bar height is the log-compressed mean FFT
//!   magnitude over the bar's frequency band, optionally spaced on the
//!   Bark scale. Spectra are stored unscaled; `normalise_magnitudes`
//!   applies the `2 / frame_count` amplitude scaling at render time

mod render;
mod ring;

pub use render::{fade_weight, Bar, BarPalette, Rgba};

use crate::error::{AudioError, Result};
use crate::spectrum::{bark_to_hertz, frequency_to_bin, hertz_to_bark};
use crate::MAX_CHANNELS;
use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};
use ring::FrameRing;
use std::sync::Arc;
use waveform_core::{AudioPacket, SampleRate, VisualisationMode, VisualiserConfig};

/// Packets kept for smoothing
pub const VISUALISER_RING_DEPTH: usize = 10;

/// Visual multiplier applied to time-domain amplitudes
const TIME_DOMAIN_SCALE: f32 = 10.0;

/// Visualiser state for one stream
pub struct VisualiserContext {
    frame_count: usize,
    sample_rate: SampleRate,

    /// Mono time-domain packets
    frames: FrameRing,
    /// Unscaled magnitude spectra of `frames`, written in lockstep
    spectra: FrameRing,

    fft: Arc<dyn RealToComplex<f32>>,
    fft_input: Vec<f32>,
    fft_output: Vec<Complex32>,
    fft_scratch: Vec<Complex32>,

    palette: BarPalette,
}

impl VisualiserContext {
    /// Allocate an empty ring for packets of `frame_count` frames
    ///
    /// # Errors
    ///
    /// `frame_count` of zero or a zero sample rate.
    pub fn new(frame_count: usize, sample_rate: SampleRate) -> Result<Self> {
        if frame_count == 0 {
            return Err(AudioError::InvalidFrameCount(frame_count));
        }
        if sample_rate.as_hz() == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate.as_hz()));
        }

        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(frame_count);
        let fft_input = fft.make_input_vec();
        let fft_output = fft.make_output_vec();
        let fft_scratch = fft.make_scratch_vec();
        let bins = fft_output.len();

        tracing::debug!(
            frame_count,
            bins,
            depth = VISUALISER_RING_DEPTH,
            "Visualiser initialised"
        );

        Ok(Self {
            frame_count,
            sample_rate,
            frames: FrameRing::new(VISUALISER_RING_DEPTH, frame_count),
            spectra: FrameRing::new(VISUALISER_RING_DEPTH, bins),
            fft,
            fft_input,
            fft_output,
            fft_scratch,
            palette: BarPalette::default(),
        })
    }

    /// Frames per packet
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Magnitude bins per spectrum (`frame_count / 2 + 1`)
    pub fn bins(&self) -> usize {
        self.fft_output.len()
    }

    /// Number of ring slots holding data
    pub fn populated(&self) -> usize {
        self.frames.len()
    }

    /// True until the first packet arrives (or after `reset`)
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current bar colours
    pub fn palette(&self) -> BarPalette {
        self.palette
    }

    /// Replace the bar colours
    pub fn set_palette(&mut self, palette: BarPalette) {
        self.palette = palette;
    }

    /// Downmix one interleaved packet to mono and store it in the ring
    ///
    /// # Errors
    ///
    /// [`AudioError::PacketShape`] if the packet does not hold exactly
    /// `frame_count` frames of `channels` channels, and
    /// [`AudioError::UnsupportedChannels`] for a channel count of zero or
    /// above [`MAX_CHANNELS`]. The ring is unchanged on error.
    pub fn accumulate(&mut self, samples: &[f32], channels: u16) -> Result<()> {
        if channels == 0 || usize::from(channels) > MAX_CHANNELS {
            return Err(AudioError::UnsupportedChannels(channels));
        }
        let channels = usize::from(channels);
        if samples.len() != self.frame_count * channels {
            return Err(AudioError::shape(
                self.frame_count,
                channels,
                samples.len(),
                channels,
            ));
        }

        let scale = 1.0 / channels as f32;
        self.frames.push_with(|slot| {
            for (mono, frame) in slot.iter_mut().zip(samples.chunks_exact(channels)) {
                *mono = frame.iter().sum::<f32>() * scale;
            }
        });

        if let Some(latest) = self.frames.latest() {
            self.fft_input.copy_from_slice(latest);
        }
        self.fft.process_with_scratch(
            &mut self.fft_input,
            &mut self.fft_output,
            &mut self.fft_scratch,
        )?;

        let spectrum = &self.fft_output;
        self.spectra.push_with(|slot| {
            for (magnitude, bin) in slot.iter_mut().zip(spectrum) {
                *magnitude = bin.norm();
            }
        });

        Ok(())
    }

    /// [`accumulate`](Self::accumulate) for an [`AudioPacket`]
    ///
    /// # Errors
    ///
    /// As for `accumulate`.
    pub fn accumulate_packet(&mut self, packet: &AudioPacket) -> Result<()> {
        self.accumulate(packet.samples(), packet.channels())
    }

    /// Empty the ring, e.g. on a track change
    pub fn reset(&mut self) {
        self.frames.clear();
        self.spectra.clear();
    }

    /// Lay out bars across `width` x `height` pixels
    ///
    /// One bar every `config.gap_size` pixels. Returns no bars while the ring
    /// is empty or the area is degenerate.
    pub fn render(&self, width: u32, height: u32, config: &VisualiserConfig) -> Vec<Bar> {
        if self.is_empty() || width == 0 || height == 0 {
            return Vec::new();
        }

        let step = config.gap_size.max(1);
        let height = height as f32;
        let mut bars = Vec::with_capacity((width / step).saturating_add(1) as usize);

        for x in (0..width).step_by(step as usize) {
            let f = x as f32 / width as f32;
            let raw = match config.mode {
                VisualisationMode::TimeDomain => self.time_height(f, height),
                VisualisationMode::FrequencyDomain => {
                    let upper = (x.saturating_add(step) as f32 / width as f32).min(1.0);
                    self.frequency_height(f, upper, height, config)
                }
            };
            let bar_height = if raw.is_finite() {
                raw.clamp(0.0, height)
            } else {
                0.0
            };

            bars.push(Bar {
                x,
                height: bar_height,
                colour: self.palette.colour_at(f, config.fade_edges),
            });
        }

        bars
    }

    fn time_height(&self, f: f32, height: f32) -> f32 {
        let index = ((f * self.frame_count as f32) as usize).min(self.frame_count - 1);
        let total: f32 = self.frames.populated().map(|slot| slot[index].abs()).sum();
        let mean = total / self.frames.len() as f32;
        mean * TIME_DOMAIN_SCALE * height / 2.0
    }

    fn frequency_height(
        &self,
        lower: f32,
        upper: f32,
        height: f32,
        config: &VisualiserConfig,
    ) -> f32 {
        let (low_hz, high_hz) = band_edges(lower, upper, config);
        let nyquist = self.sample_rate.nyquist();
        let bins = self.bins();
        let a = frequency_to_bin(low_hz, nyquist, bins);
        let b = frequency_to_bin(high_hz, nyquist, bins);
        let (first, last) = (a.min(b), a.max(b));

        if config.use_bark_scale && config.hide_collapsed_bars && first == last {
            return 0.0;
        }

        let width = (last - first + 1) as f32;
        let total: f32 = self
            .spectra
            .populated()
            .map(|spectrum| spectrum[first..=last].iter().sum::<f32>() / width)
            .sum();
        let mut magnitude = total / self.spectra.len() as f32;
        if config.normalise_magnitudes {
            magnitude *= 2.0 / self.frame_count as f32;
        }

        (config.gain + magnitude).log10() * height
    }
}

/// Frequency band (Hz) covered by the bar spanning progress `[lower, upper]`
fn band_edges(lower: f32, upper: f32, config: &VisualiserConfig) -> (f32, f32) {
    let (min, max) = (config.minimum_frequency, config.maximum_frequency);
    if config.use_bark_scale {
        let (bark_min, bark_max) = (hertz_to_bark(min), hertz_to_bark(max));
        let span = bark_max - bark_min;
        (
            bark_to_hertz(bark_min + span * lower),
            bark_to_hertz(bark_min + span * upper),
        )
    } else {
        let span = max - min;
        (min + span * lower, min + span * upper)
    }
}

impl std::fmt::Debug for VisualiserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualiserContext")
            .field("frame_count", &self.frame_count)
            .field("sample_rate", &self.sample_rate)
            .field("populated", &self.populated())
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_config(gap: u32) -> VisualiserConfig {
        VisualiserConfig {
            mode: VisualisationMode::TimeDomain,
            gap_size: gap,
            fade_edges: false,
            ..VisualiserConfig::default()
        }
    }

    #[test]
    fn test_empty_renders_nothing() {
        let ctx = VisualiserContext::new(800, SampleRate::DVD_QUALITY).unwrap();
        assert!(ctx.is_empty());
        assert!(ctx.render(400, 100, &VisualiserConfig::default()).is_empty());
    }

    #[test]
    fn test_rejects_bad_packets() {
        let mut ctx = VisualiserContext::new(64, SampleRate::DVD_QUALITY).unwrap();
        assert!(matches!(
            ctx.accumulate(&[0.0; 100], 2),
            Err(AudioError::PacketShape { .. })
        ));
        assert!(matches!(
            ctx.accumulate(&[0.0; 128], 0),
            Err(AudioError::UnsupportedChannels(0))
        ));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_downmix_averages_channels() {
        let mut ctx = VisualiserContext::new(4, SampleRate::DVD_QUALITY).unwrap();
        // Left 0.2, right 0.0 -> mono 0.1
        ctx.accumulate(&[0.2, 0.0, 0.2, 0.0, 0.2, 0.0, 0.2, 0.0], 2)
            .unwrap();

        let bars = ctx.render(4, 100, &time_config(1));
        assert_eq!(bars.len(), 4);
        for bar in bars {
            // 0.1 * 10 * 50
            assert!((bar.height - 50.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_bar_positions_follow_gap() {
        let mut ctx = VisualiserContext::new(64, SampleRate::DVD_QUALITY).unwrap();
        ctx.accumulate(&[0.01; 128], 2).unwrap();

        let xs: Vec<u32> = ctx.render(20, 10, &time_config(5)).iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![0, 5, 10, 15]);
    }

    #[test]
    fn test_huge_gap_renders_single_bar() {
        let mut ctx = VisualiserContext::new(64, SampleRate::DVD_QUALITY).unwrap();
        ctx.accumulate(&[0.25; 64], 1).unwrap();
        let config = VisualiserConfig {
            gap_size: u32::MAX,
            use_bark_scale: false,
            ..VisualiserConfig::default()
        };

        for width in [1, 10, u32::MAX] {
            let bars = ctx.render(width, 100, &config);
            assert_eq!(bars.len(), 1, "width {}", width);
            assert_eq!(bars[0].x, 0);
            assert!(bars[0].height.is_finite());
        }
    }

    #[test]
    fn test_reset_empties_ring() {
        let mut ctx = VisualiserContext::new(64, SampleRate::DVD_QUALITY).unwrap();
        ctx.accumulate(&[0.5; 64], 1).unwrap();
        assert_eq!(ctx.populated(), 1);

        ctx.reset();
        assert!(ctx.is_empty());
        assert!(ctx.render(100, 100, &time_config(5)).is_empty());
    }

    #[test]
    fn test_band_edges_linear() {
        let config = VisualiserConfig {
            use_bark_scale: false,
            minimum_frequency: 0.0,
            maximum_frequency: 1000.0,
            ..VisualiserConfig::default()
        };
        assert_eq!(band_edges(0.25, 0.5, &config), (250.0, 500.0));
    }

    #[test]
    fn test_band_edges_bark_spends_more_bars_on_lows() {
        let config = VisualiserConfig::default();
        let (_, first_quarter) = band_edges(0.0, 0.25, &config);
        // A quarter of the display in Hz would reach ~5 kHz
        assert!(first_quarter < 1000.0, "got {}", first_quarter);
    }
}
