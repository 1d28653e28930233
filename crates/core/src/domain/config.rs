//! Engine configuration
//!
//! Every constant the DSP relies on (comb/allpass tables, dB floors and
//! ceilings, safety margins) lives in [`EngineConfig`] and is handed to the
//! engine at construction time. Configurations round-trip through TOML:
//!
//! ```toml
//! [mapping]
//! min_gain_db = -60.0
//!
//! [mapping.delay_time_scale]
//! kind = "tempo_synced"
//! bpm = 120.0
//! max_beats = 4.0
//!
//! [reverb]
//! comb_delays_ms = [29.7, 37.1, 41.1, 43.7]
//! tail_factor = 0.4
//! ```

use crate::domain::audio::EngineError;
use crate::domain::mapping::{DelayGainScale, DelayTimeScale};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or saving a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] EngineError),
}

/// Position-to-parameter mapping constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Decay time at the right edge of the gate area (reverb mode)
    pub max_decay_ms: f32,
    /// Volume at the top of the gate area in delay mode (150 = +3.5 dB)
    pub delay_volume_max_percent: f32,
    /// Volume at the top of the gate area in reverb mode
    pub reverb_volume_max_percent: f32,
    /// Gain floor shared by both modes
    pub min_gain_db: f32,
    pub delay_max_gain_db: f32,
    pub reverb_max_gain_db: f32,
    /// Volumes at or below this percentage map straight to `min_gain_db`
    pub silent_percent: f32,
    /// How the horizontal axis maps to delay time
    pub delay_time_scale: DelayTimeScale,
    /// How the vertical axis maps to delay gain
    pub delay_gain_scale: DelayGainScale,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            max_decay_ms: 10_000.0,
            delay_volume_max_percent: 150.0,
            reverb_volume_max_percent: 100.0,
            min_gain_db: -60.0,
            delay_max_gain_db: 3.5,
            reverb_max_gain_db: 0.0,
            silent_percent: 0.1,
            delay_time_scale: DelayTimeScale::default(),
            delay_gain_scale: DelayGainScale::default(),
        }
    }
}

/// Schroeder reverberator constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Parallel comb delays, mutually detuned
    pub comb_delays_ms: Vec<f32>,
    /// Serial allpass delays
    pub allpass_delays_ms: Vec<f32>,
    pub allpass_gain: f32,
    /// Ceiling on the derived comb feedback gain
    pub max_feedback: f32,
    /// Gates quieter than this are not rendered
    pub audibility_floor_db: f32,
    /// Fraction of the longest decay kept as tail after the input ends
    pub tail_factor: f32,
    /// Upper bound on the rendered tail, in seconds
    pub max_tail_secs: f32,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            comb_delays_ms: vec![29.7, 37.1, 41.1, 43.7],
            allpass_delays_ms: vec![5.0, 1.7],
            allpass_gain: 0.7,
            max_feedback: 0.98,
            audibility_floor_db: -50.0,
            tail_factor: 0.4,
            max_tail_secs: 600.0,
        }
    }
}

/// Multi-tap delay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Extra tail past the longest tap, in seconds
    pub safety_margin_secs: f32,
    /// Taps further out than this are not rendered
    pub max_tap_secs: f32,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            safety_margin_secs: 0.5,
            max_tap_secs: 600.0,
        }
    }
}

/// Output stage constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Peaks at or below this level are treated as silence
    pub silence_threshold: f32,
    /// Pull peaks above 1.0 back to unity after mixing
    pub normalize: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 0.001,
            normalize: true,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mapping: MappingConfig,
    pub reverb: ReverbConfig,
    pub delay: DelayConfig,
    pub output: OutputConfig,
}

fn invalid(msg: impl Into<String>) -> EngineError {
    EngineError::InvalidConfiguration(msg.into())
}

fn non_negative(name: &str, value: f32) -> std::result::Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite and >= 0, got {value}")))
    }
}

impl EngineConfig {
    /// Reject constants that would make the filters unstable or the
    /// derived lengths meaningless
    pub fn validate(&self) -> std::result::Result<(), EngineError> {
        let reverb = &self.reverb;
        if !(0.0..1.0).contains(&reverb.max_feedback) {
            return Err(invalid(format!(
                "reverb.max_feedback must be in [0, 1), got {}",
                reverb.max_feedback
            )));
        }
        if reverb.allpass_gain.is_nan() || reverb.allpass_gain.abs() >= 1.0 {
            return Err(invalid(format!(
                "reverb.allpass_gain must satisfy |g| < 1, got {}",
                reverb.allpass_gain
            )));
        }
        if reverb.comb_delays_ms.is_empty() {
            return Err(invalid("reverb.comb_delays_ms must not be empty"));
        }
        for &delay in reverb.comb_delays_ms.iter().chain(&reverb.allpass_delays_ms) {
            non_negative("reverb delay", delay)?;
        }
        non_negative("reverb.tail_factor", reverb.tail_factor)?;
        non_negative("reverb.max_tail_secs", reverb.max_tail_secs)?;
        non_negative("delay.safety_margin_secs", self.delay.safety_margin_secs)?;
        non_negative("delay.max_tap_secs", self.delay.max_tap_secs)?;
        non_negative("output.silence_threshold", self.output.silence_threshold)?;
        non_negative("mapping.max_decay_ms", self.mapping.max_decay_ms)?;

        let mapping = &self.mapping;
        if let DelayGainScale::LinearDb { range_db } = mapping.delay_gain_scale {
            non_negative("mapping.delay_gain_scale.range_db", range_db)?;
        }
        if mapping.min_gain_db > mapping.delay_max_gain_db
            || mapping.min_gain_db > mapping.reverb_max_gain_db
        {
            return Err(invalid(format!(
                "mapping.min_gain_db ({}) exceeds a gain ceiling",
                mapping.min_gain_db
            )));
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading engine configuration");

        let contents = fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&contents)?;

        debug!("Engine configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving engine configuration");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(path, self.to_toml_string()?).await?;

        debug!("Engine configuration saved successfully");
        Ok(())
    }
}
