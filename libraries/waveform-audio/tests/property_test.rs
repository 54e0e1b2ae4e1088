//! Property-based tests for the equaliser, visualiser and frequency math
//!
//! Uses proptest to verify invariants across many random inputs.

use proptest::prelude::*;
use waveform_audio::{
    bark_to_hertz, hertz_to_bark, Equaliser, VisualiserContext, VISUALISER_RING_DEPTH,
};
use waveform_core::{FrequencyRange, SampleRate, VisualisationMode, VisualiserConfig};

// ===== Helpers =====

fn arbitrary_range() -> impl Strategy<Value = FrequencyRange> {
    (-1_000.0f32..30_000.0, -1_000.0f32..30_000.0, 0.0f32..4.0)
        .prop_map(|(a, b, m)| FrequencyRange::new(a, b, m))
}

fn arbitrary_config() -> impl Strategy<Value = VisualiserConfig> {
    (
        prop_oneof![
            Just(VisualisationMode::TimeDomain),
            Just(VisualisationMode::FrequencyDomain)
        ],
        1u32..20,
        0.0f32..2_000.0,
        2_000.0f32..30_000.0,
        any::<bool>(),
        any::<bool>(),
        0.01f32..20.0,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(mode, gap_size, minimum, maximum, bark, fade, gain, hide, normalise)| VisualiserConfig {
                mode,
                gap_size,
                minimum_frequency: minimum,
                maximum_frequency: maximum,
                use_bark_scale: bark,
                fade_edges: fade,
                gain,
                hide_collapsed_bars: hide,
                normalise_magnitudes: normalise,
            },
        )
}

// ===== Property Tests =====

proptest! {
    /// Property: Bark conversion round-trips across the audible band
    #[test]
    fn bark_round_trip_within_one_hertz(hz in 20.0f32..20_000.0) {
        let back = bark_to_hertz(hertz_to_bark(hz));
        prop_assert!((back - hz).abs() < 1.0, "{} -> {}", hz, back);
    }

    /// Property: Bark scale is strictly increasing
    #[test]
    fn bark_is_monotonic(a in 0.0f32..24_000.0, delta in 1.0f32..1_000.0) {
        prop_assert!(hertz_to_bark(a + delta) > hertz_to_bark(a));
    }

    /// Property: Equaliser output keeps packet length and stays finite
    #[test]
    fn equaliser_preserves_shape(
        ranges in prop::collection::vec(arbitrary_range(), 0..4),
        packets in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 128), 1..6)
    ) {
        let mut eq = Equaliser::new(64, 2, SampleRate::DVD_QUALITY).unwrap();
        for (n, packet) in packets.iter().enumerate() {
            let mut buffer = packet.clone();
            eq.process(&mut buffer, &ranges).unwrap();
            prop_assert_eq!(buffer.len(), 128);
            prop_assert!(buffer.iter().all(|s| s.is_finite()));
            if n < 2 {
                prop_assert!(buffer.iter().all(|&s| s == 0.0));
            }
        }
    }

    /// Property: Time-domain render reflects exactly the most recent ring-depth packets
    #[test]
    fn ring_keeps_most_recent_packets(values in prop::collection::vec(0.0f32..0.01, 1..30)) {
        let mut ctx = VisualiserContext::new(16, SampleRate::DVD_QUALITY).unwrap();
        for &value in &values {
            ctx.accumulate(&[value; 16], 1).unwrap();
        }

        let kept = values.len().min(VISUALISER_RING_DEPTH);
        let recent = &values[values.len() - kept..];
        let expected = recent.iter().sum::<f32>() / kept as f32 * 10.0 * 100.0 / 2.0;

        let config = VisualiserConfig {
            mode: VisualisationMode::TimeDomain,
            gap_size: 4,
            ..VisualiserConfig::default()
        };
        for bar in ctx.render(16, 100, &config) {
            prop_assert!((bar.height - expected).abs() < 1e-3);
        }
    }

    /// Property: Bars are always finite, inside the area and ordered left to right
    #[test]
    fn bars_stay_in_bounds(
        config in arbitrary_config(),
        samples in prop::collection::vec(-1.0f32..1.0, 256),
        width in 1u32..800,
        height in 1u32..300,
    ) {
        let mut ctx = VisualiserContext::new(128, SampleRate::DVD_QUALITY).unwrap();
        ctx.accumulate(&samples, 2).unwrap();

        let bars = ctx.render(width, height, &config);
        prop_assert!(!bars.is_empty());
        for pair in bars.windows(2) {
            prop_assert!(pair[0].x < pair[1].x);
        }
        for bar in &bars {
            prop_assert!(bar.x < width);
            prop_assert!(bar.height.is_finite());
            prop_assert!(bar.height >= 0.0 && bar.height <= height as f32);
            let c = bar.colour;
            prop_assert!([c.r, c.g, c.b, c.a].iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }
}
