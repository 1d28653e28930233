//! Effect engine facade
//!
//! [`EffectEngine`] owns the current mode, gate list and mix levels and
//! dispatches each `process` call to the delay or reverb pipeline, finishing
//! with the output normalizer. It is the only type a host needs.

use crate::domain::audio::{Result, Signal};
use crate::domain::config::{EngineConfig, MappingConfig, OutputConfig, ReverbConfig};
use crate::domain::delay::MultiTapDelay;
use crate::domain::gate::{EffectMode, Gate};
use crate::domain::mapping::{GateArea, ParameterMapper};
use crate::domain::mixer::{MixLevels, Normalizer};
use crate::domain::reverb::MultiInstanceReverb;
use tracing::{debug, info, instrument, warn};

/// State persisted across `process` calls
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    pub mode: EffectMode,
    pub gates: Vec<Gate>,
    pub mix: MixLevels,
    /// Fraction of the longest decay kept as reverb tail
    pub tail_factor: f32,
}

impl EffectConfig {
    fn new(tail_factor: f32) -> Self {
        Self {
            mode: EffectMode::default(),
            gates: Vec::new(),
            mix: MixLevels::UNITY,
            tail_factor,
        }
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self::new(ReverbConfig::default().tail_factor)
    }
}

/// Mode-switching delay/reverb engine
#[derive(Debug, Clone)]
pub struct EffectEngine {
    config: EngineConfig,
    mapper: ParameterMapper,
    delay: MultiTapDelay,
    reverb: MultiInstanceReverb,
    normalizer: Normalizer,
    effect: EffectConfig,
}

impl EffectEngine {
    /// Build an engine from validated constants
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            mapper: ParameterMapper::new(config.mapping.clone()),
            delay: MultiTapDelay::new(&config.delay),
            reverb: MultiInstanceReverb::new(&config.reverb),
            normalizer: Normalizer::new(config.output.silence_threshold),
            effect: EffectConfig::new(config.reverb.tail_factor),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn effect(&self) -> &EffectConfig {
        &self.effect
    }

    pub fn mapper(&self) -> &ParameterMapper {
        &self.mapper
    }

    pub fn mode(&self) -> EffectMode {
        self.effect.mode
    }

    /// Switch pipelines; gates are kept as they are
    pub fn set_mode(&mut self, mode: EffectMode) {
        if self.effect.mode != mode {
            info!(from = %self.effect.mode, to = %mode, "Effect mode switched");
            self.effect.mode = mode;
        }
    }

    pub fn gates(&self) -> &[Gate] {
        &self.effect.gates
    }

    pub fn set_gates(&mut self, gates: Vec<Gate>) {
        debug!(gates = gates.len(), "Gates updated");
        self.effect.gates = gates;
    }

    /// Replace the gate list with positions mapped in the current mode
    pub fn set_gates_from_positions(&mut self, positions: &[(f32, f32)], area: &GateArea) {
        let mode = self.effect.mode;
        let gates = positions
            .iter()
            .map(|&(x, y)| self.mapper.map_gate_in_area(mode, x, y, area))
            .collect();
        self.set_gates(gates);
    }

    pub fn mix(&self) -> MixLevels {
        self.effect.mix
    }

    pub fn set_mix(&mut self, mix: MixLevels) {
        debug!(dry = mix.dry(), wet = mix.wet(), "Mix levels updated");
        self.effect.mix = mix;
    }

    pub fn tail_factor(&self) -> f32 {
        self.effect.tail_factor
    }

    /// Negative and NaN factors are stored as zero
    pub fn set_tail_factor(&mut self, tail_factor: f32) {
        self.effect.tail_factor = if tail_factor.is_nan() {
            0.0
        } else {
            tail_factor.max(0.0)
        };
    }

    /// Render `input` through the current pipeline
    #[instrument(skip(self, input), fields(mode = %self.effect.mode, len = input.len()))]
    pub fn process(&self, input: &Signal) -> Signal {
        let effect = &self.effect;
        if effect.gates.is_empty() {
            warn!("No gates configured");
        }

        let output = match effect.mode {
            EffectMode::Delay => self.delay.process(input, &effect.gates, effect.mix),
            EffectMode::Reverb => {
                self.reverb
                    .process(input, &effect.gates, effect.mix, effect.tail_factor)
            }
        };

        let output = finish(output, &self.config.output, &self.normalizer);
        debug!(output_len = output.len(), peak = output.peak(), "Processing complete");
        output
    }

    /// Validate raw samples and render them
    pub fn process_samples(&self, samples: Vec<f32>, sample_rate_hz: u32) -> Result<Signal> {
        let input = Signal::new(samples, sample_rate_hz)?;
        Ok(self.process(&input))
    }
}

/// Normalize unless the caller turned it off
fn finish(signal: Signal, output: &OutputConfig, normalizer: &Normalizer) -> Signal {
    if !output.normalize {
        return signal;
    }
    let sample_rate = signal.sample_rate();
    let mut samples = signal.into_samples();
    normalizer.apply(&mut samples);
    Signal::from_parts(samples, sample_rate)
}

/// Map one position inside a frame to gate parameters
pub fn map_gate_parameters(
    config: &MappingConfig,
    mode: EffectMode,
    x: f32,
    y: f32,
    frame_width: f32,
    frame_height: f32,
) -> Gate {
    ParameterMapper::new(config.clone()).map_gate(mode, x, y, frame_width, frame_height)
}

/// One-shot multi-tap delay with output normalization
pub fn process_delay(
    config: &EngineConfig,
    input: &Signal,
    taps: &[Gate],
    dry: f32,
    wet: f32,
) -> Signal {
    let output = MultiTapDelay::new(&config.delay).process(input, taps, MixLevels::new(dry, wet));
    finish(output, &config.output, &Normalizer::new(config.output.silence_threshold))
}

/// One-shot multi-instance reverb with output normalization
pub fn process_reverb(
    config: &EngineConfig,
    input: &Signal,
    gates: &[Gate],
    dry: f32,
    wet: f32,
    tail_factor: f32,
) -> Signal {
    let mix = MixLevels::new(dry, wet);
    let output = MultiInstanceReverb::new(&config.reverb).process(input, gates, mix, tail_factor);
    finish(output, &config.output, &Normalizer::new(config.output.silence_threshold))
}
