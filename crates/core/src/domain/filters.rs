//! Comb and allpass filters over a circular delay buffer
//!
//! Both filters are pure functions of `(input, delay_samples, gain)`: the
//! delay buffer is allocated per call and dropped on return, so no state
//! carries over between calls.

/// Convert milliseconds to a whole number of samples: `round(sr * ms / 1000)`
///
/// NaN and non-positive durations yield zero. Durations too long for a
/// `usize` (including `+inf`) saturate at `usize::MAX`; callers that allocate
/// from the result must bound it first.
#[inline]
pub fn ms_to_samples(sample_rate: f32, ms: f32) -> usize {
    let samples = (sample_rate * ms / 1000.0).round();
    if samples.is_nan() || samples <= 0.0 {
        0
    } else {
        samples as usize
    }
}

/// Fixed-capacity circular buffer with a single read/write cursor
///
/// The slot under the cursor holds the value written `len` samples ago.
struct DelayLine {
    buffer: Vec<f32>,
    cursor: usize,
}

impl DelayLine {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            cursor: 0,
        }
    }

    /// Value written `len` samples ago
    #[inline]
    fn read(&self) -> f32 {
        self.buffer[self.cursor]
    }

    /// Overwrite the oldest slot and advance
    #[inline]
    fn write(&mut self, value: f32) {
        self.buffer[self.cursor] = value;
        self.cursor += 1;
        if self.cursor == self.buffer.len() {
            self.cursor = 0;
        }
    }
}

/// Feedback comb filter: `y[n] = x[n] + g*y[n-D]`
///
/// `gain` must satisfy `|g| < 1` for the output to stay bounded; callers
/// clamp it before getting here. A zero delay returns the input unchanged.
pub fn comb_filter(input: &[f32], delay_samples: usize, gain: f32) -> Vec<f32> {
    if delay_samples == 0 {
        return input.to_vec();
    }

    let mut line = DelayLine::new(delay_samples);
    input
        .iter()
        .map(|&x| {
            let y = x + gain * line.read();
            line.write(y);
            y
        })
        .collect()
}

/// Schroeder allpass filter: `y[n] = -g*x[n] + x[n-D] + g*y[n-D]`
///
/// The line stores `x[n] + g*y[n]`, which folds both delayed terms into a
/// single read. A zero delay returns the input unchanged.
pub fn allpass_filter(input: &[f32], delay_samples: usize, gain: f32) -> Vec<f32> {
    if delay_samples == 0 {
        return input.to_vec();
    }

    let mut line = DelayLine::new(delay_samples);
    input
        .iter()
        .map(|&x| {
            let y = -gain * x + line.read();
            line.write(x + gain * y);
            y
        })
        .collect()
}
