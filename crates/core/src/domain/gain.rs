//! Decibel conversions shared by the mapper, the delay and the reverb

/// Convert decibels to a linear amplitude factor: `10^(db/20)`
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude factor to decibels: `20*log10(amp)`
///
/// Non-positive amplitudes return negative infinity.
#[inline]
pub fn linear_to_db(amp: f32) -> f32 {
    if amp <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * amp.log10()
    }
}

/// Convert a volume percentage (100% = unity) to decibels
///
/// Percentages at or below `silent_percent` collapse to `floor_db`; the
/// result is always clamped to `[floor_db, ceiling_db]`.
#[inline]
pub fn percent_to_db(percent: f32, silent_percent: f32, floor_db: f32, ceiling_db: f32) -> f32 {
    if percent.is_nan() || percent <= silent_percent {
        return floor_db;
    }
    linear_to_db(percent / 100.0).clamp(floor_db, ceiling_db)
}
