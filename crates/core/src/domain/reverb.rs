//! Schroeder reverberation
//!
//! [`SchroederReverb`] is the classic two-stage topology: parallel feedback
//! combs tuned to mutually detuned delays, averaged, then a short chain of
//! allpass diffusers. [`MultiInstanceReverb`] runs one reverberator per gate
//! and sums them over the dry signal.

use crate::domain::audio::Signal;
use crate::domain::config::ReverbConfig;
use crate::domain::filters::{allpass_filter, comb_filter, ms_to_samples};
use crate::domain::gain::db_to_linear;
use crate::domain::gate::Gate;
use crate::domain::mixer::{add_scaled, MixLevels};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

/// One reverberator: N parallel combs into M serial allpasses
#[derive(Debug, Clone)]
pub struct SchroederReverb {
    comb_delays_ms: Vec<f32>,
    allpass_delays_ms: Vec<f32>,
    allpass_gain: f32,
    max_feedback: f32,
}

impl SchroederReverb {
    pub fn new(config: &ReverbConfig) -> Self {
        Self {
            comb_delays_ms: config.comb_delays_ms.clone(),
            allpass_delays_ms: config.allpass_delays_ms.clone(),
            allpass_gain: config.allpass_gain,
            max_feedback: config.max_feedback,
        }
    }

    /// Mean comb delay, in samples
    pub fn mean_comb_delay_samples(&self, sample_rate: f32) -> usize {
        if self.comb_delays_ms.is_empty() {
            return 0;
        }
        let mean_ms = self.comb_delays_ms.iter().sum::<f32>() / self.comb_delays_ms.len() as f32;
        ms_to_samples(sample_rate, mean_ms)
    }

    /// Comb feedback gain for a target decay: `g = 10^(-3*D_avg / (T*fs))`
    ///
    /// Clamped to `[0, max_feedback]`; a non-positive decay gives 0.
    pub fn feedback_gain(&self, sample_rate: f32, decay_ms: f32) -> f32 {
        let decay_secs = decay_ms / 1000.0;
        if decay_secs.is_nan() || decay_secs <= 0.0 {
            return 0.0;
        }

        let delay = self.mean_comb_delay_samples(sample_rate) as f32;
        let g = 10.0_f32.powf(-3.0 * delay / (decay_secs * sample_rate));
        if g.is_finite() {
            g.clamp(0.0, self.max_feedback)
        } else {
            0.0
        }
    }

    /// Reverberate `input`; the output has the same length as the input
    ///
    /// `input_gain` is applied to the signal before it enters the combs.
    pub fn process(
        &self,
        input: &[f32],
        sample_rate: f32,
        decay_ms: f32,
        input_gain: f32,
    ) -> Vec<f32> {
        let feedback = self.feedback_gain(sample_rate, decay_ms);
        let scaled: Vec<f32> = input.iter().map(|&x| x * input_gain).collect();

        let combs = self.parallel_combs(&scaled, sample_rate, feedback);
        let out = self.serial_allpasses(combs, sample_rate);

        trace!(decay_ms, input_gain, feedback, "Schroeder reverb rendered");
        out
    }

    /// Average of all combs; zero-length combs contribute silence
    fn parallel_combs(&self, input: &[f32], sample_rate: f32, feedback: f32) -> Vec<f32> {
        let mut sum = vec![0.0_f32; input.len()];
        for &delay_ms in &self.comb_delays_ms {
            let delay = ms_to_samples(sample_rate, delay_ms);
            if delay > 0 {
                add_scaled(&mut sum, 0, &comb_filter(input, delay, feedback), 1.0);
            }
        }

        let count = self.comb_delays_ms.len().max(1) as f32;
        for sample in sum.iter_mut() {
            *sample /= count;
        }
        sum
    }

    fn serial_allpasses(&self, input: Vec<f32>, sample_rate: f32) -> Vec<f32> {
        self.allpass_delays_ms
            .iter()
            .map(|&delay_ms| ms_to_samples(sample_rate, delay_ms))
            .filter(|&delay| delay > 0)
            .fold(input, |signal, delay| {
                allpass_filter(&signal, delay, self.allpass_gain)
            })
    }
}

impl Default for SchroederReverb {
    fn default() -> Self {
        Self::new(&ReverbConfig::default())
    }
}

/// One independent reverberator per gate, summed over the dry signal
#[derive(Debug, Clone)]
pub struct MultiInstanceReverb {
    reverb: SchroederReverb,
    audibility_floor_db: f32,
    max_tail_secs: f32,
}

impl MultiInstanceReverb {
    pub fn new(config: &ReverbConfig) -> Self {
        Self {
            reverb: SchroederReverb::new(config),
            audibility_floor_db: config.audibility_floor_db,
            max_tail_secs: config.max_tail_secs,
        }
    }

    pub fn reverb(&self) -> &SchroederReverb {
        &self.reverb
    }

    /// Samples appended after the input: `tail_factor` of the longest decay,
    /// capped at `max_tail_secs`
    pub fn tail_samples(&self, sample_rate: f32, gates: &[Gate], tail_factor: f32) -> usize {
        let longest = gates
            .iter()
            .map(|gate| gate.time_ms())
            .fold(0.0_f32, f32::max);
        let limit = ms_to_samples(sample_rate, self.max_tail_secs * 1000.0);
        ms_to_samples(sample_rate, longest * tail_factor).min(limit)
    }

    /// Render every audible gate without normalization
    ///
    /// Gates below the audibility floor are skipped; when none remain the
    /// input is returned unchanged. Each reverberator runs over the input
    /// padded to the full output length so the tail carries its decay.
    pub fn process(
        &self,
        input: &Signal,
        gates: &[Gate],
        mix: MixLevels,
        tail_factor: f32,
    ) -> Signal {
        let audible: Vec<Gate> = gates
            .iter()
            .copied()
            .filter(|gate| gate.gain_db() >= self.audibility_floor_db)
            .collect();

        if audible.is_empty() {
            warn!(
                gates = gates.len(),
                floor_db = self.audibility_floor_db,
                "No audible reverb gates, passing input through"
            );
            return input.clone();
        }

        let sample_rate = input.sample_rate().as_f32();
        let tail = self.tail_samples(sample_rate, &audible, tail_factor);
        let total = input.len().saturating_add(tail);

        debug!(
            gates = audible.len(),
            skipped = gates.len() - audible.len(),
            input_len = input.len(),
            tail_samples = tail,
            "Rendering multi-instance reverb"
        );

        let mut padded = input.samples().to_vec();
        padded.resize(total, 0.0);

        let mut output = vec![0.0_f32; total];
        add_scaled(&mut output, 0, input.samples(), mix.dry());

        if mix.wet() > 0.0 {
            // Each instance renders into its own buffer; summing in gate
            // order keeps the result independent of thread scheduling.
            let renders: Vec<Vec<f32>> = audible
                .par_iter()
                .map(|gate| {
                    let gain = db_to_linear(gate.gain_db()).clamp(0.0, 1.0);
                    self.reverb.process(&padded, sample_rate, gate.time_ms(), gain)
                })
                .collect();

            for render in &renders {
                add_scaled(&mut output, 0, render, mix.wet());
            }
        }

        Signal::from_parts(output, input.sample_rate())
    }
}

impl Default for MultiInstanceReverb {
    fn default() -> Self {
        Self::new(&ReverbConfig::default())
    }
}
