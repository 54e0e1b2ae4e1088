//! Frequency-scale math shared by the equaliser and the visualiser
//!
//! - Bark <-> Hertz conversion for perceptually even bar spacing
//! - Hertz -> FFT bin mapping for both stages
//! - Polar-form magnitude scaling of spectral bins

use realfft::num_complex::Complex32;
use std::ops::RangeInclusive;

/// Upper clamp for inverse Bark conversion (well above any audio Nyquist)
const MAX_HERTZ: f64 = 100_000.0;

/// Newton refinement steps for the inverse Bark mapping
const NEWTON_STEPS: usize = 24;

fn bark(hz: f64) -> f64 {
    13.0 * (0.00076 * hz).atan() + 3.5 * (hz / 7500.0).powi(2).atan()
}

fn bark_slope(hz: f64) -> f64 {
    let a = 0.00076 * hz;
    let b = hz / 7500.0;
    13.0 * 0.00076 / (1.0 + a * a) + 3.5 * (2.0 * hz / (7500.0 * 7500.0)) / (1.0 + b.powi(4))
}

/// Traunmüller's closed-form inverse, with its low and high end corrections
fn traunmuller_hertz(bark: f64) -> f64 {
    let z = if bark < 2.0 {
        (bark - 0.3) / 0.85
    } else if bark > 20.1 {
        (bark + 4.422) / 1.22
    } else {
        bark
    };
    1960.0 * (z + 0.53) / (26.28 - z)
}

/// Convert a frequency to the Bark scale
///
/// `bark(f) = 13·atan(0.00076·f) + 3.5·atan((f / 7500)²)`
pub fn hertz_to_bark(hz: f32) -> f32 {
    bark(f64::from(hz)) as f32
}

/// Convert a Bark value back to Hertz
///
/// Starts from the piecewise Traunmüller inverse and refines it against
/// `hertz_to_bark`, so the two functions round-trip. Non-positive input maps
/// to 0 Hz.
pub fn bark_to_hertz(bark_value: f32) -> f32 {
    let target = f64::from(bark_value);
    if !target.is_finite() || target <= 0.0 {
        return 0.0;
    }

    let mut hz = traunmuller_hertz(target).clamp(0.0, MAX_HERTZ);
    for _ in 0..NEWTON_STEPS {
        let slope = bark_slope(hz);
        if slope <= f64::EPSILON {
            break;
        }
        let step = (bark(hz) - target) / slope;
        hz = (hz - step).clamp(0.0, MAX_HERTZ);
        if step.abs() < 1e-7 {
            break;
        }
    }

    hz as f32
}

/// Map a frequency to the nearest bin of a real-FFT spectrum with `bins` entries
///
/// Bin `bins - 1` sits on the Nyquist frequency. Out-of-range input is clamped.
pub fn frequency_to_bin(frequency: f32, nyquist: f32, bins: usize) -> usize {
    if bins == 0 || nyquist <= 0.0 {
        return 0;
    }
    let last = bins - 1;
    let position = (frequency / nyquist * last as f32).round();
    if position.is_nan() || position <= 0.0 {
        0
    } else {
        (position as usize).min(last)
    }
}

/// Bins an equaliser range covers in a `fft_len`-point transform
///
/// `bin = frequency / (sample_rate / fft_len)`, truncated, then widened by one
/// bin either side to make up for the finite bin width and clamped to
/// `[0, fft_len - 1]`. Returns `None` if nothing is covered (for instance
/// when `minimum > maximum`).
pub fn equaliser_bins(
    minimum: f32,
    maximum: f32,
    sample_rate: f32,
    fft_len: usize,
) -> Option<RangeInclusive<usize>> {
    if fft_len == 0 || sample_rate <= 0.0 {
        return None;
    }

    let resolution = sample_rate / fft_len as f32;
    let last = fft_len as i64 - 1;
    let lower = ((minimum / resolution) as i64 - 1).max(0);
    let upper = ((maximum / resolution) as i64 + 1).min(last);

    if lower > upper {
        return None;
    }
    Some(lower as usize..=upper as usize)
}

/// Multiply the magnitude of `value` by `multiplier`, preserving phase
pub fn scale_magnitude(value: Complex32, multiplier: f32) -> Complex32 {
    Complex32::from_polar(value.norm() * multiplier, value.arg())
}
