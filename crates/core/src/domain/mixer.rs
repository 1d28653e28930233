//! Dry/wet levels, buffer summing and peak normalization
//!
//! Both effect pipelines accumulate independent signal paths into one
//! buffer with [`add_scaled`] and finish with a single [`Normalizer`] pass.

use crate::domain::gain::linear_to_db;
use crate::domain::mapping::ParameterMapper;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

/// Independent dry and wet levels, each in `[0,1]`
///
/// The two levels are not a crossfade: both may sit at 1.0 at once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMixLevels")]
pub struct MixLevels {
    dry: f32,
    wet: f32,
}

/// Unchecked levels as they appear in a document
#[derive(Deserialize)]
struct RawMixLevels {
    dry: f32,
    wet: f32,
}

impl From<RawMixLevels> for MixLevels {
    fn from(raw: RawMixLevels) -> Self {
        Self::new(raw.dry, raw.wet)
    }
}

impl MixLevels {
    pub const UNITY: MixLevels = MixLevels { dry: 1.0, wet: 1.0 };

    pub fn new(dry: f32, wet: f32) -> Self {
        Self {
            dry: clamp_level(dry),
            wet: clamp_level(wet),
        }
    }

    /// Levels read off two vertical faders sharing the same travel
    pub fn from_faders(dry_y: f32, wet_y: f32, top: f32, bottom: f32) -> Self {
        Self::new(
            ParameterMapper::map_fader(dry_y, top, bottom),
            ParameterMapper::map_fader(wet_y, top, bottom),
        )
    }

    pub fn dry(&self) -> f32 {
        self.dry
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }
}

impl Default for MixLevels {
    fn default() -> Self {
        Self::UNITY
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Add `source * gain` into `dest`, starting at `offset`
///
/// Samples that would land past the end of `dest` are dropped.
#[inline]
pub fn add_scaled(dest: &mut [f32], offset: usize, source: &[f32], gain: f32) {
    if offset >= dest.len() || gain == 0.0 {
        return;
    }
    for (out, &x) in dest[offset..].iter_mut().zip(source) {
        *out += x * gain;
    }
}

/// Largest absolute sample value
#[inline]
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// Peak-based output safeguard
///
/// Pulls the largest excursion back to exactly 1.0 when the buffer clips,
/// leaves quieter buffers untouched and never divides by a near-silent peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    silence_threshold: f32,
}

impl Normalizer {
    pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.001;

    pub fn new(silence_threshold: f32) -> Self {
        Self { silence_threshold }
    }

    /// Normalize in place, returning the pre-normalization peak if scaling
    /// was applied
    pub fn apply(&self, buffer: &mut [f32]) -> Option<f32> {
        let peak = peak(buffer);
        if peak <= self.silence_threshold {
            trace!(peak, "Buffer below silence threshold, skipping normalization");
            return None;
        }
        if peak <= 1.0 {
            return None;
        }

        // Dividing (rather than multiplying by 1/peak) lands the peak on
        // exactly 1.0, so a second pass is a no-op.
        for sample in buffer.iter_mut() {
            *sample /= peak;
        }

        info!(peak_db = linear_to_db(peak), "Normalization applied");
        Some(peak)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SILENCE_THRESHOLD)
    }
}
