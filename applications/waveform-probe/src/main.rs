/// Waveform Probe - drive the post-processing pipeline without a GUI
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::f32::consts::PI;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waveform_audio::{
    packet_channel, AudioPipeline, Bar, VisualiserContext, DEFAULT_HANDOFF_CAPACITY,
};
use waveform_core::{
    packet_rate, EqualiserPreset, Preferences, SampleRate, SharedPreferences, VisualisationMode,
    AUDIO_FREQUENCY, CHANNELS, PACKET_SIZE,
};

#[derive(Parser)]
#[command(name = "waveform-probe")]
#[command(about = "Push synthetic audio through the Waveform equaliser and visualiser", long_about = None)]
struct Cli {
    /// Preferences file (TOML or JSON); WAVEFORM__* variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesise tones, run them through the pipeline and print the bars
    Render {
        /// Tone frequencies in Hz
        #[arg(short, long, value_delimiter = ',', default_value = "1000")]
        tone: Vec<f32>,

        /// Equaliser preset to apply (enables the equaliser)
        #[arg(short, long)]
        preset: Option<EqualiserPreset>,

        /// Override the display mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Packets to synthesise
        #[arg(long, default_value_t = 30)]
        packets: usize,

        /// Render width in pixels (one column per bar)
        #[arg(long, default_value_t = 400)]
        width: u32,

        /// Render height in text rows
        #[arg(long, default_value_t = 16)]
        height: u32,

        /// Mute the output (the visualiser keeps running)
        #[arg(long)]
        mute: bool,
    },
    /// List the factory equaliser presets
    Presets,
    /// Print the effective preferences and any problems with them
    ShowConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Time,
    Frequency,
}

impl From<ModeArg> for VisualisationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Time => VisualisationMode::TimeDomain,
            ModeArg::Frequency => VisualisationMode::FrequencyDomain,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waveform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let preferences = Preferences::load(cli.config.as_deref())
        .context("Failed to load preferences")?;

    match cli.command {
        Commands::Render {
            tone,
            preset,
            mode,
            packets,
            width,
            height,
            mute,
        } => {
            let mut preferences = preferences;
            if let Some(preset) = preset {
                preferences.apply_preset(preset);
            }
            if let Some(mode) = mode {
                preferences.visualiser.mode = mode.into();
            }
            render(preferences, &tone, packets, width, height, mute)?;
        }
        Commands::Presets => list_presets(),
        Commands::ShowConfig => show_config(&preferences)?,
    }

    Ok(())
}

fn render(
    preferences: Preferences,
    tones: &[f32],
    packets: usize,
    width: u32,
    height: u32,
    mute: bool,
) -> anyhow::Result<()> {
    let sample_rate = SampleRate::new(AUDIO_FREQUENCY);
    let shared = SharedPreferences::new(preferences);

    let (tx, rx) = packet_channel(DEFAULT_HANDOFF_CAPACITY);
    let mut pipeline = AudioPipeline::new(PACKET_SIZE, sample_rate, shared.clone(), tx)?;
    let mut visualiser = VisualiserContext::new(PACKET_SIZE, sample_rate)?;
    pipeline.mute_handle().set_muted(mute);

    tracing::info!(
        "Synthesising {} packets ({:.2} s at {:.0} packets/s)",
        packets,
        packets as f32 / packet_rate(sample_rate, PACKET_SIZE),
        packet_rate(sample_rate, PACKET_SIZE)
    );

    // Audio callback and UI idle drain, interleaved on one thread
    let mut peak_out = 0.0f32;
    let mut delivered = 0;
    for n in 0..packets {
        let mut packet = synthesise(tones, sample_rate, n * PACKET_SIZE, PACKET_SIZE);
        pipeline.process(&mut packet)?;
        peak_out = packet.iter().fold(peak_out, |m, s| m.max(s.abs()));
        delivered += rx.drain_into(&mut visualiser);
    }

    let snapshot = shared.snapshot();
    let bars = visualiser.render(width, height, &snapshot.visualiser);

    print_bars(&bars, height);
    println!();
    println!(
        "mode: {:?}  bars: {}  delivered: {}  dropped: {}",
        snapshot.visualiser.mode,
        bars.len(),
        delivered,
        pipeline.dropped_packets()
    );
    println!(
        "equaliser: {}  latency: {} frames  peak output: {:.3}",
        if snapshot.equaliser.enabled {
            "on"
        } else {
            "off"
        },
        pipeline.equaliser().latency_frames(),
        peak_out
    );

    Ok(())
}

/// Interleaved stereo sum of equal-level sines, continuing from `start_frame`
fn synthesise(tones: &[f32], sample_rate: SampleRate, start_frame: usize, frames: usize) -> Vec<f32> {
    let channels = usize::from(CHANNELS);
    let level = if tones.is_empty() {
        0.0
    } else {
        0.5 / tones.len() as f32
    };
    let mut samples = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        let t = (start_frame + i) as f32 / sample_rate.as_hz() as f32;
        let value: f32 = tones
            .iter()
            .map(|&hz| level * (2.0 * PI * hz * t).sin())
            .sum();
        samples.extend(std::iter::repeat(value).take(channels));
    }
    samples
}

fn print_bars(bars: &[Bar], height: u32) {
    for row in (1..=height).rev() {
        let line: String = bars
            .iter()
            .map(|bar| if bar.height >= row as f32 - 0.5 { '#' } else { ' ' })
            .collect();
        println!("{}", line.trim_end());
    }
    println!("{}", "-".repeat(bars.len()));
}

fn list_presets() {
    for preset in EqualiserPreset::ALL {
        let ranges: Vec<String> = preset
            .ranges()
            .iter()
            .map(|r| format!("{}-{} Hz x{}", r.minimum, r.maximum, r.multiplier))
            .collect();
        println!("{:<22} {:<22} {}", preset.id(), preset.name(), ranges.join(", "));
    }
}

fn show_config(preferences: &Preferences) -> anyhow::Result<()> {
    println!("{}", preferences.to_json()?);

    let problems = preferences.problems(SampleRate::new(AUDIO_FREQUENCY));
    if problems.is_empty() {
        println!("No problems found");
    } else {
        for problem in problems {
            println!("warning: {}", problem);
        }
    }
    Ok(())
}
