//! Fushimi CLI Application
//!
//! Renders a WAV file through the gate-driven delay or reverb engine.

mod wav;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fushimi_core::domain::config::EngineConfig;
use fushimi_core::domain::engine::EffectEngine;
use fushimi_core::domain::gate::{EffectMode, Gate};
use fushimi_core::domain::mapping::GateArea;
use fushimi_core::domain::mixer::MixLevels;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Delay,
    Reverb,
}

impl From<Mode> for EffectMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Delay => EffectMode::Delay,
            Mode::Reverb => EffectMode::Reverb,
        }
    }
}

#[derive(Parser)]
#[command(name = "fushimi")]
#[command(about = "Gate-driven multi-tap delay and Schroeder reverb", long_about = None)]
struct Cli {
    /// Input WAV file (multichannel input is mixed down to mono)
    input: PathBuf,

    /// Output WAV file (32-bit float, mono)
    output: PathBuf,

    /// Effect pipeline
    #[arg(short, long, value_enum, default_value = "delay")]
    mode: Mode,

    /// Gate as TIME_MS:GAIN_DB (repeatable)
    #[arg(short, long = "gate", value_parser = parse_pair)]
    gates: Vec<(f32, f32)>,

    /// Gate position as X:Y inside the frame (repeatable)
    #[arg(short, long = "position", value_parser = parse_pair)]
    positions: Vec<(f32, f32)>,

    /// Frame size as WIDTH:HEIGHT for --position
    #[arg(long, value_parser = parse_pair, default_value = "1000:800")]
    frame: (f32, f32),

    /// Dry level in [0, 1]
    #[arg(long, default_value_t = 1.0)]
    dry: f32,

    /// Wet level in [0, 1]
    #[arg(long, default_value_t = 1.0)]
    wet: f32,

    /// Reverb tail as a fraction of the longest decay
    #[arg(long)]
    tail_factor: Option<f32>,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pair(s: &str) -> std::result::Result<(f32, f32), String> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| format!("expected A:B, got '{s}'"))?;
    let a = a.trim().parse::<f32>().map_err(|e| format!("'{a}': {e}"))?;
    let b = b.trim().parse::<f32>().map_err(|e| format!("'{b}': {e}"))?;
    Ok((a, b))
}

fn build_engine(cli: &Cli, config: EngineConfig) -> Result<EffectEngine> {
    let mut engine = EffectEngine::new(config).context("Invalid engine configuration")?;
    let mode = EffectMode::from(cli.mode);
    engine.set_mode(mode);
    engine.set_mix(MixLevels::new(cli.dry, cli.wet));
    if let Some(tail_factor) = cli.tail_factor {
        engine.set_tail_factor(tail_factor);
    }

    if !cli.positions.is_empty() {
        let (width, height) = cli.frame;
        engine.set_gates_from_positions(&cli.positions, &GateArea::frame(width, height));
    }

    let mut gates = engine.gates().to_vec();
    gates.extend(cli.gates.iter().map(|&(time_ms, gain_db)| match mode {
        EffectMode::Delay => Gate::delay(time_ms, gain_db),
        EffectMode::Reverb => Gate::reverb(time_ms, gain_db),
    }));
    engine.set_gates(gates);

    Ok(engine)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Fushimi starting...");

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let engine = build_engine(&cli, config)?;
    if engine.gates().is_empty() {
        warn!("No --gate or --position given, output is the dry signal");
    }

    let input_path = cli.input.clone();
    let (samples, sample_rate) = tokio::task::spawn_blocking(move || wav::read_mono(&input_path))
        .await
        .context("WAV reader task failed")??;

    info!(
        path = %cli.input.display(),
        samples = samples.len(),
        sample_rate,
        mode = %engine.mode(),
        gates = engine.gates().len(),
        "Rendering"
    );

    let output = tokio::task::spawn_blocking(move || engine.process_samples(samples, sample_rate))
        .await
        .context("Render task failed")?
        .context("Input rejected by the engine")?;

    let output_path = cli.output.clone();
    let written = output.len();
    tokio::task::spawn_blocking(move || wav::write_mono(&output_path, &output))
        .await
        .context("WAV writer task failed")??;

    info!(path = %cli.output.display(), samples = written, "Written");
    Ok(())
}
