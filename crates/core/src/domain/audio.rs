//! Signal model and engine errors
//!
//! A [`Signal`] is a fully-buffered mono sample sequence plus its sample rate.
//! Construction is the only place the engine validates its inputs; every DSP
//! routine downstream of a `Signal` is infallible.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when the caller hands the engine unusable input
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Sample rate of zero
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// NaN or infinite sample in the input buffer
    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    /// Engine constants that would make the DSP unstable or meaningless
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Audio sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleRate {
    Hz22050,
    Hz44100,
    Hz48000,
    Hz96000,
    Custom(u32),
}

impl SampleRate {
    pub fn hz(&self) -> u32 {
        match self {
            SampleRate::Hz22050 => 22050,
            SampleRate::Hz44100 => 44100,
            SampleRate::Hz48000 => 48000,
            SampleRate::Hz96000 => 96000,
            SampleRate::Custom(hz) => *hz,
        }
    }

    pub fn from_hz(hz: u32) -> Self {
        match hz {
            22050 => SampleRate::Hz22050,
            44100 => SampleRate::Hz44100,
            48000 => SampleRate::Hz48000,
            96000 => SampleRate::Hz96000,
            hz => SampleRate::Custom(hz),
        }
    }

    /// Sample rate as a float, for time conversions
    #[inline]
    pub fn as_f32(&self) -> f32 {
        self.hz() as f32
    }
}

/// Mono, fully-buffered audio
///
/// Immutable once built: processing always allocates a fresh `Signal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: SampleRate,
}

impl Signal {
    /// Build a signal, rejecting a zero sample rate or non-finite samples
    pub fn new(samples: Vec<f32>, sample_rate_hz: u32) -> Result<Self> {
        if sample_rate_hz == 0 {
            return Err(EngineError::InvalidSampleRate(sample_rate_hz));
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(EngineError::NonFiniteSample { index });
        }

        Ok(Self {
            samples,
            sample_rate: SampleRate::from_hz(sample_rate_hz),
        })
    }

    /// Wrap an engine-produced buffer whose invariants are already known to hold
    pub(crate) fn from_parts(samples: Vec<f32>, sample_rate: SampleRate) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.as_f32()
    }

    /// Largest absolute sample value (0.0 for an empty signal)
    pub fn peak(&self) -> f32 {
        crate::domain::mixer::peak(&self.samples)
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}
