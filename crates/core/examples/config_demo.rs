//! Example demonstrating configuration loading and both effect modes
//!
//! Run with: cargo run --package fushimi-core --example config_demo

use fushimi_core::domain::audio::Signal;
use fushimi_core::domain::config::EngineConfig;
use fushimi_core::domain::engine::EffectEngine;
use fushimi_core::domain::gate::EffectMode;
use fushimi_core::domain::mapping::GateArea;
use fushimi_core::domain::mixer::MixLevels;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("fushimi_core=debug,info")
        .init();

    println!("=== Fushimi Configuration Demo ===\n");

    // 1. Save the default configuration
    println!("1. Saving default configuration...");
    let config_path = std::env::temp_dir().join("fushimi_demo.toml");
    EngineConfig::default().save_to_file(&config_path).await?;
    println!("   ✓ Configuration saved to {}", config_path.display());

    // 2. Load it back
    println!("\n2. Loading configuration from file...");
    let config = EngineConfig::load_from_file(&config_path).await?;
    println!(
        "   ✓ {} combs, {} allpasses, feedback ceiling {}",
        config.reverb.comb_delays_ms.len(),
        config.reverb.allpass_delays_ms.len(),
        config.reverb.max_feedback
    );

    // 3. Place three gates on an 800x600 canvas
    println!("\n3. Mapping gate positions...");
    let mut engine = EffectEngine::new(config)?;
    let area = GateArea::frame(800.0, 600.0);
    let positions = [(100.0, 150.0), (400.0, 300.0), (700.0, 450.0)];
    engine.set_gates_from_positions(&positions, &area);
    engine.set_mix(MixLevels::new(1.0, 0.8));

    for (i, gate) in engine.gates().iter().enumerate() {
        println!(
            "   {}. time {:.0} ms, gain {:.1} dB",
            i + 1,
            gate.time_ms(),
            gate.gain_db()
        );
    }

    // 4. Render a short click through the delay
    let mut click = vec![0.0_f32; 4410];
    click[..32].fill(0.9);
    let input = Signal::new(click, 44100)?;

    println!("\n4. Delay render...");
    let delayed = engine.process(&input);
    println!(
        "   ✓ {:.2} s in, {:.2} s out, peak {:.3}",
        input.duration_secs(),
        delayed.duration_secs(),
        delayed.peak()
    );

    // 5. Same positions as reverberators
    println!("\n5. Reverb render...");
    engine.set_mode(EffectMode::Reverb);
    engine.set_gates_from_positions(&positions, &area);
    let reverberated = engine.process(&input);
    println!(
        "   ✓ {:.2} s in, {:.2} s out, peak {:.3}",
        input.duration_secs(),
        reverberated.duration_secs(),
        reverberated.peak()
    );

    tokio::fs::remove_file(&config_path).await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}
