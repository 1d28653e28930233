//! Domain entities and business rules

pub mod audio;
pub mod config;
pub mod delay;
pub mod engine;
pub mod filters;
pub mod gain;
pub mod gate;
pub mod mapping;
pub mod mixer;
pub mod reverb;

pub use audio::{EngineError, Result, SampleRate, Signal};
pub use config::{ConfigError, DelayConfig, EngineConfig, MappingConfig, OutputConfig, ReverbConfig};
pub use delay::MultiTapDelay;
pub use engine::{map_gate_parameters, process_delay, process_reverb, EffectConfig, EffectEngine};
pub use filters::{allpass_filter, comb_filter, ms_to_samples};
pub use gain::{db_to_linear, linear_to_db, percent_to_db};
pub use gate::{EffectMode, Gate};
pub use mapping::{DelayGainScale, DelayTimeScale, GateArea, ParameterMapper};
pub use mixer::{add_scaled, peak, MixLevels, Normalizer};
pub use reverb::{MultiInstanceReverb, SchroederReverb};
