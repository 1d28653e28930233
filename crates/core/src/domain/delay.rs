//! Multi-tap delay
//!
//! Each tap is one shifted, scaled copy of the whole input. Taps are summed
//! independently on top of the dry copy, so processing order has no effect
//! on the result.

use crate::domain::audio::Signal;
use crate::domain::config::DelayConfig;
use crate::domain::filters::ms_to_samples;
use crate::domain::gain::db_to_linear;
use crate::domain::gate::Gate;
use crate::domain::mixer::{add_scaled, MixLevels};
use tracing::{debug, trace};

/// Dry signal plus any number of time/gain-shifted copies
#[derive(Debug, Clone)]
pub struct MultiTapDelay {
    safety_margin_secs: f32,
    max_tap_secs: f32,
}

impl MultiTapDelay {
    pub fn new(config: &DelayConfig) -> Self {
        Self {
            safety_margin_secs: config.safety_margin_secs,
            max_tap_secs: config.max_tap_secs,
        }
    }

    /// Offset of a tap in samples, or `None` when the tap is not rendered
    ///
    /// Non-finite times and offsets past `max_tap_secs` are skipped.
    pub fn tap_shift(&self, sample_rate: f32, tap: &Gate) -> Option<usize> {
        let time_ms = tap.time_ms();
        if !time_ms.is_finite() {
            return None;
        }
        let shift = ms_to_samples(sample_rate, time_ms);
        let limit = ms_to_samples(sample_rate, self.max_tap_secs * 1000.0);
        (shift <= limit).then_some(shift)
    }

    /// Samples appended after the input: the longest rendered tap offset
    /// plus the safety margin, or zero when no tap is rendered
    pub fn tail_samples(&self, sample_rate: f32, taps: &[Gate]) -> usize {
        let longest = taps
            .iter()
            .filter_map(|tap| self.tap_shift(sample_rate, tap))
            .max();

        match longest {
            Some(shift) => {
                shift.saturating_add(ms_to_samples(sample_rate, self.safety_margin_secs * 1000.0))
            }
            None => 0,
        }
    }

    /// Render the delay without normalization
    ///
    /// The dry copy is scaled by `mix.dry()`, every tap by its own gain
    /// times `mix.wet()`.
    pub fn process(&self, input: &Signal, taps: &[Gate], mix: MixLevels) -> Signal {
        let sample_rate = input.sample_rate().as_f32();
        let samples = input.samples();
        let tail = self.tail_samples(sample_rate, taps);

        debug!(
            taps = taps.len(),
            input_len = samples.len(),
            tail_samples = tail,
            "Rendering multi-tap delay"
        );

        let mut output = vec![0.0_f32; samples.len().saturating_add(tail)];
        add_scaled(&mut output, 0, samples, mix.dry());

        for (i, tap) in taps.iter().enumerate() {
            let gain = db_to_linear(tap.gain_db()) * mix.wet();
            if !gain.is_finite() {
                trace!(tap = i, gain_db = tap.gain_db(), "Skipping tap with non-finite gain");
                continue;
            }

            let Some(shift) = self.tap_shift(sample_rate, tap) else {
                trace!(tap = i, time_ms = tap.time_ms(), "Tap time out of range, skipping");
                continue;
            };
            if shift.saturating_add(samples.len()) > output.len() {
                trace!(tap = i, shift, "Tap does not fit in output, skipping");
                continue;
            }

            add_scaled(&mut output, shift, samples, gain);
            trace!(tap = i, time_ms = tap.time_ms(), gain_db = tap.gain_db(), shift, "Tap added");
        }

        Signal::from_parts(output, input.sample_rate())
    }
}

impl Default for MultiTapDelay {
    fn default() -> Self {
        Self::new(&DelayConfig::default())
    }
}
