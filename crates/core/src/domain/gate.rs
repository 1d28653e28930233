//! Effect modes and gate parameters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pipeline a `process` call runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMode {
    #[default]
    Delay,
    Reverb,
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectMode::Delay => f.write_str("delay"),
            EffectMode::Reverb => f.write_str("reverb"),
        }
    }
}

/// One control point: an echo in delay mode, a reverberator in reverb mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Gate {
    Delay { time_ms: f32, gain_db: f32 },
    Reverb { decay_ms: f32, gain_db: f32 },
}

impl Gate {
    pub fn delay(time_ms: f32, gain_db: f32) -> Self {
        Gate::Delay { time_ms, gain_db }
    }

    pub fn reverb(decay_ms: f32, gain_db: f32) -> Self {
        Gate::Reverb { decay_ms, gain_db }
    }

    /// Mode this gate was authored for
    pub fn mode(&self) -> EffectMode {
        match self {
            Gate::Delay { .. } => EffectMode::Delay,
            Gate::Reverb { .. } => EffectMode::Reverb,
        }
    }

    /// Time parameter: echo offset or decay time, in milliseconds
    pub fn time_ms(&self) -> f32 {
        match *self {
            Gate::Delay { time_ms, .. } => time_ms,
            Gate::Reverb { decay_ms, .. } => decay_ms,
        }
    }

    pub fn gain_db(&self) -> f32 {
        match *self {
            Gate::Delay { gain_db, .. } | Gate::Reverb { gain_db, .. } => gain_db,
        }
    }
}
