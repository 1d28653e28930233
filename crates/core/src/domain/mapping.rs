//! Gate position to parameter mapping
//!
//! Gates live on a 2D area. The horizontal axis controls time (echo offset
//! in delay mode, decay time in reverb mode) and the vertical axis controls
//! level, with the top edge loudest. Out-of-range positions are clamped,
//! never rejected.

use crate::domain::config::MappingConfig;
use crate::domain::gain::percent_to_db;
use crate::domain::gate::{EffectMode, Gate};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Horizontal scale of the delay time axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelayTimeScale {
    /// Right edge = `max_time_ms`
    Absolute { max_time_ms: f32 },
    /// Right edge = `max_beats` beats at `bpm`
    TempoSynced { bpm: f32, max_beats: f32 },
}

impl Default for DelayTimeScale {
    fn default() -> Self {
        DelayTimeScale::Absolute {
            max_time_ms: 4000.0,
        }
    }
}

impl DelayTimeScale {
    /// Time at the right edge of the gate area, in milliseconds
    pub fn max_time_ms(&self) -> f32 {
        let ms = match *self {
            DelayTimeScale::Absolute { max_time_ms } => max_time_ms,
            DelayTimeScale::TempoSynced { bpm, max_beats } => {
                if bpm > 0.0 {
                    max_beats * 60_000.0 / bpm
                } else {
                    0.0
                }
            }
        };
        if ms.is_finite() {
            ms.max(0.0)
        } else {
            0.0
        }
    }

    /// Delay time for a normalized horizontal position
    #[inline]
    pub fn time_ms(&self, x_norm: f32) -> f32 {
        x_norm * self.max_time_ms()
    }
}

/// Vertical scale of the delay gain axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelayGainScale {
    /// Top edge = `delay_volume_max_percent`, converted to decibels
    #[default]
    Percent,
    /// Decibels fall linearly from 0 at the top edge to `-range_db` at the
    /// bottom edge
    LinearDb { range_db: f32 },
}

impl DelayGainScale {
    /// Delay gain for a normalized vertical position (0 = top)
    pub fn gain_db(&self, y_norm: f32, config: &MappingConfig) -> f32 {
        match *self {
            DelayGainScale::Percent => percent_to_db(
                (1.0 - y_norm) * config.delay_volume_max_percent,
                config.silent_percent,
                config.min_gain_db,
                config.delay_max_gain_db,
            ),
            DelayGainScale::LinearDb { range_db } => {
                let db = -y_norm * range_db;
                if db.is_nan() {
                    config.min_gain_db
                } else {
                    db.clamp(config.min_gain_db, config.delay_max_gain_db)
                }
            }
        }
    }
}

/// Rectangle gates can be placed in, in host coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateArea {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl GateArea {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Area anchored at the frame origin
    pub fn frame(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Area spanning two corners
    pub fn from_bounds(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Position normalized to `[0,1]` on both axes
    pub fn normalize(&self, x: f32, y: f32) -> (f32, f32) {
        (
            normalize_axis(x, self.left, self.width),
            normalize_axis(y, self.top, self.height),
        )
    }
}

/// Normalize one coordinate, mapping degenerate extents and NaN to 0
fn normalize_axis(value: f32, origin: f32, extent: f32) -> f32 {
    if !extent.is_finite() || extent <= 0.0 {
        return 0.0;
    }
    let norm = (value - origin) / extent;
    if norm.is_nan() {
        0.0
    } else {
        norm.clamp(0.0, 1.0)
    }
}

/// Converts gate positions into [`Gate`] parameters
#[derive(Debug, Clone, Default)]
pub struct ParameterMapper {
    config: MappingConfig,
}

impl ParameterMapper {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Map a position inside a `frame_width` x `frame_height` frame
    pub fn map_gate(
        &self,
        mode: EffectMode,
        x: f32,
        y: f32,
        frame_width: f32,
        frame_height: f32,
    ) -> Gate {
        self.map_gate_in_area(mode, x, y, &GateArea::frame(frame_width, frame_height))
    }

    /// Map a position inside an arbitrary gate area
    pub fn map_gate_in_area(&self, mode: EffectMode, x: f32, y: f32, area: &GateArea) -> Gate {
        let (x_norm, y_norm) = area.normalize(x, y);
        let cfg = &self.config;

        let gate = match mode {
            EffectMode::Delay => Gate::Delay {
                time_ms: cfg.delay_time_scale.time_ms(x_norm),
                gain_db: cfg.delay_gain_scale.gain_db(y_norm, cfg),
            },
            EffectMode::Reverb => {
                let volume_percent = (1.0 - y_norm) * cfg.reverb_volume_max_percent;
                Gate::Reverb {
                    decay_ms: x_norm * cfg.max_decay_ms,
                    gain_db: percent_to_db(
                        volume_percent,
                        cfg.silent_percent,
                        cfg.min_gain_db,
                        cfg.reverb_max_gain_db,
                    ),
                }
            }
        };

        trace!(%mode, x, y, ?gate, "Gate mapped");
        gate
    }

    /// Level of a vertical fader: 1.0 at `top`, 0.0 at `bottom`
    pub fn map_fader(y: f32, top: f32, bottom: f32) -> f32 {
        let range = bottom - top;
        let range = if range == 0.0 { 1.0 } else { range };
        let level = 1.0 - (y - top) / range;
        if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        }
    }
}
