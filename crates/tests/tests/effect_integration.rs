//! Integration tests for the effect engine
//!
//! These exercise the full pipeline from gate positions through the delay and
//! reverb renderers to the output normalizer.

use fushimi_core::domain::audio::Signal;
use fushimi_core::domain::config::{DelayConfig, EngineConfig};
use fushimi_core::domain::delay::MultiTapDelay;
use fushimi_core::domain::engine::{process_delay, process_reverb, EffectEngine};
use fushimi_core::domain::gain::{db_to_linear, linear_to_db};
use fushimi_core::domain::gate::{EffectMode, Gate};
use fushimi_core::domain::mapping::GateArea;
use fushimi_core::domain::mixer::MixLevels;
use fushimi_core::domain::reverb::SchroederReverb;
use fushimi_tests::{dc, energy, impulse, signal, sine, SAMPLE_RATE};
use proptest::prelude::*;
use tempfile::TempDir;

fn engine(mode: EffectMode, gates: Vec<Gate>, mix: MixLevels) -> EffectEngine {
    let mut engine = EffectEngine::new(EngineConfig::default()).unwrap();
    engine.set_mode(mode);
    engine.set_gates(gates);
    engine.set_mix(mix);
    engine
}

// ============================================================================
// DRY PATH
// ============================================================================

#[test]
fn test_wet_zero_delay_is_dry_only() {
    let input = sine(440.0, 0.8, 100.0);
    let gates = vec![Gate::delay(50.0, 0.0), Gate::delay(120.0, 3.5)];

    let out = engine(EffectMode::Delay, gates, MixLevels::new(0.6, 0.0)).process(&input);

    for (o, i) in out.samples().iter().zip(input.samples()) {
        assert!((o - i * 0.6).abs() < 1e-6);
    }
    assert!(out.samples()[input.len()..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_wet_zero_reverb_is_dry_only() {
    let input = sine(220.0, 0.5, 50.0);
    let gates = vec![Gate::reverb(800.0, -3.0), Gate::reverb(1500.0, -12.0)];

    let out = engine(EffectMode::Reverb, gates, MixLevels::new(0.9, 0.0)).process(&input);

    assert!(out.len() > input.len());
    for (o, i) in out.samples().iter().zip(input.samples()) {
        assert!((o - i * 0.9).abs() < 1e-6);
    }
    assert!(out.samples()[input.len()..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_empty_gates_in_both_modes() {
    let input = sine(330.0, 0.5, 20.0);

    let delayed = engine(EffectMode::Delay, Vec::new(), MixLevels::new(0.5, 1.0)).process(&input);
    assert_eq!(delayed.len(), input.len());
    for (o, i) in delayed.samples().iter().zip(input.samples()) {
        assert!((o - i * 0.5).abs() < 1e-6);
    }

    let reverberated =
        engine(EffectMode::Reverb, Vec::new(), MixLevels::new(0.5, 1.0)).process(&input);
    assert_eq!(reverberated, input);
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_single_tap_on_dc() {
    let input = dc(1.0, SAMPLE_RATE as usize);
    let taps = [Gate::delay(500.0, -6.0)];

    let raw = MultiTapDelay::default().process(&input, &taps, MixLevels::UNITY);
    let jump = raw.samples()[22050] - raw.samples()[22049];
    assert!((jump - 0.501).abs() < 1e-3);

    let out = process_delay(&EngineConfig::default(), &input, &taps, 1.0, 1.0);
    assert!(out.peak() <= 1.0 + 1e-6);
    assert!(out.samples()[22050] > out.samples()[22049]);
}

#[test]
fn test_impulse_reverb_rings_and_decays() {
    let sample_rate = SAMPLE_RATE as f32;
    let reverb = SchroederReverb::default();
    assert!(reverb.feedback_gain(sample_rate, 2000.0).abs() <= 0.98);

    let input = impulse(2 * SAMPLE_RATE as usize);
    let out = reverb.process(input.samples(), sample_rate, 2000.0, 1.0);

    // Still audible a full second after the impulse
    assert!(energy(&out[SAMPLE_RATE as usize..]) > 1e-6);

    let window = 4 * 1927;
    let envelope: Vec<f32> = out.chunks_exact(window).map(energy).collect();
    assert!(envelope.windows(2).all(|pair| pair[1] < pair[0]));
}

#[test]
fn test_reverb_tail_outlasts_input() {
    let input = impulse(4410);
    let out = process_reverb(
        &EngineConfig::default(),
        &input,
        &[Gate::reverb(2000.0, 0.0)],
        1.0,
        1.0,
        0.4,
    );

    // 2000 ms * 0.4 = 800 ms of tail
    assert_eq!(out.len(), 4410 + 35280);
    assert!(energy(&out.samples()[4410..]) > 0.0);
    assert!(out.peak() <= 1.0 + 1e-6);
}

#[test]
fn test_sub_floor_gates_pass_input_through() {
    let input = sine(440.0, 0.7, 30.0);
    let gates = vec![Gate::reverb(3000.0, -55.0), Gate::reverb(6000.0, -60.0)];

    let out = engine(EffectMode::Reverb, gates, MixLevels::UNITY).process(&input);
    assert_eq!(out, input);
}

#[test]
fn test_unbounded_gate_times_render() {
    let input = sine(440.0, 0.5, 10.0);
    let len = input.len();

    let gates = vec![
        Gate::delay(1.0e30, 0.0),
        Gate::delay(f32::INFINITY, 0.0),
        Gate::delay(f32::NAN, 0.0),
    ];
    let delayed = engine(EffectMode::Delay, gates, MixLevels::UNITY).process(&input);
    assert_eq!(delayed.len(), len);

    let mut config = EngineConfig::default();
    config.reverb.max_tail_secs = 0.1;
    let huge = [Gate::reverb(1.0e30, 0.0)];
    let reverberated = process_reverb(&config, &input, &huge, 1.0, 1.0, 0.4);
    assert_eq!(reverberated.len(), len + SAMPLE_RATE as usize / 10);
    assert!(reverberated.samples().iter().all(|s| s.is_finite()));
}

// ============================================================================
// MODE SWITCHING AND MAPPING
// ============================================================================

#[test]
fn test_mode_switch_keeps_state() {
    let area = GateArea::from_bounds(69.0, 213.0, 526.5, 642.0);
    let mut engine = engine(EffectMode::Delay, Vec::new(), MixLevels::new(0.8, 0.7));

    engine.set_gates_from_positions(&[(297.75, 213.0), (526.5, 427.5)], &area);
    let delay_gates = engine.gates().to_vec();
    assert_eq!(delay_gates.len(), 2);
    assert!(delay_gates.iter().all(|g| g.mode() == EffectMode::Delay));
    assert!((delay_gates[0].time_ms() - 2000.0).abs() < 1e-2);
    assert_eq!(delay_gates[0].gain_db(), 3.5);

    engine.set_mode(EffectMode::Reverb);
    assert_eq!(engine.gates(), delay_gates.as_slice());
    assert_eq!(engine.mix(), MixLevels::new(0.8, 0.7));

    engine.set_gates_from_positions(&[(526.5, 427.5)], &area);
    let gate = engine.gates()[0];
    assert_eq!(gate.mode(), EffectMode::Reverb);
    assert!((gate.time_ms() - 10_000.0).abs() < 1e-2);
    assert!((gate.gain_db() - linear_to_db(0.5)).abs() < 1e-3);
}

#[test]
fn test_process_is_repeatable() {
    let input = sine(440.0, 0.9, 40.0);
    let gates = vec![
        Gate::reverb(400.0, -2.0),
        Gate::reverb(900.0, -8.0),
        Gate::reverb(150.0, 0.0),
    ];
    let engine = engine(EffectMode::Reverb, gates, MixLevels::UNITY);

    let first = engine.process(&input);
    let second = engine.process(&input);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_engine_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fushimi.toml");

    let mut config = EngineConfig::default();
    config.delay.safety_margin_secs = 0.0;
    config.output.normalize = false;
    config.save_to_file(&path).await.unwrap();

    let loaded = EngineConfig::load_from_file(&path).await.unwrap();
    let mut engine = EffectEngine::new(loaded).unwrap();
    engine.set_gates(vec![Gate::delay(10.0, 6.0)]);

    let out = engine.process(&dc(1.0, 441));
    assert_eq!(out.len(), 441 + 441);
    // The tap starts where the dry copy ends; nothing is normalized
    assert_eq!(out.samples()[440], 1.0);
    assert!((out.peak() - db_to_linear(6.0)).abs() < 1e-5);
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn input_strategy() -> impl Strategy<Value = Signal> {
    prop::collection::vec(-1.0_f32..1.0, 32..256).prop_map(signal)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_output_never_clips(
        input in input_strategy(),
        reverb in any::<bool>(),
        params in prop::collection::vec((0.0_f32..400.0, -60.0_f32..6.0), 0..4),
        dry in 0.0_f32..=1.0,
        wet in 0.0_f32..=1.0,
    ) {
        let (mode, gates): (_, Vec<Gate>) = if reverb {
            (EffectMode::Reverb, params.iter().map(|&(t, g)| Gate::reverb(t, g)).collect())
        } else {
            (EffectMode::Delay, params.iter().map(|&(t, g)| Gate::delay(t, g)).collect())
        };

        let out = engine(mode, gates, MixLevels::new(dry, wet)).process(&input);

        prop_assert!(out.len() >= input.len());
        prop_assert!(out.peak() <= 1.0 + 1e-5);
    }

    #[test]
    fn prop_delay_is_additive(
        input in input_strategy(),
        a in prop::collection::vec((0.0_f32..20.0, -30.0_f32..3.5), 1..4),
        b in prop::collection::vec((0.0_f32..20.0, -30.0_f32..3.5), 1..4),
        dry in 0.0_f32..=1.0,
    ) {
        let delay = MultiTapDelay::new(&DelayConfig {
            safety_margin_secs: 0.0,
            ..DelayConfig::default()
        });
        let mix = MixLevels::new(dry, 1.0);
        let taps = |params: &[(f32, f32)]| -> Vec<Gate> {
            params.iter().map(|&(t, g)| Gate::delay(t, g)).collect()
        };
        let union: Vec<Gate> = taps(&a).into_iter().chain(taps(&b)).collect();

        let out_a = delay.process(&input, &taps(&a), mix);
        let out_b = delay.process(&input, &taps(&b), mix);
        let out_ab = delay.process(&input, &union, mix);

        let at = |s: &Signal, i: usize| s.samples().get(i).copied().unwrap_or(0.0);
        for i in 0..out_ab.len() {
            let dry_term = input.samples().get(i).copied().unwrap_or(0.0) * dry;
            let expected = at(&out_a, i) + at(&out_b, i) - dry_term;
            prop_assert!((out_ab.samples()[i] - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn prop_gain_round_trip(db in -60.0_f32..=0.0) {
        prop_assert!((linear_to_db(db_to_linear(db)) - db).abs() < 1e-3);
    }
}
