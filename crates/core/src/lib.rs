//! Fushimi effect engine
//!
//! Offline, whole-buffer rendering of a gate-driven multi-tap delay and a
//! multi-instance Schroeder reverb. See [`domain::engine::EffectEngine`] for
//! the entry point used by hosts.

pub mod domain;
