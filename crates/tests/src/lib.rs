//! Shared signal generators for the integration tests

use fushimi_core::domain::audio::Signal;

pub const SAMPLE_RATE: u32 = 44100;

/// Sine wave of `duration_ms` at `SAMPLE_RATE`
pub fn sine(frequency: f32, amplitude: f32, duration_ms: f32) -> Signal {
    let num_samples = (SAMPLE_RATE as f32 * duration_ms / 1000.0) as usize;
    let samples = (0..num_samples)
        .map(|i| 2.0 * std::f32::consts::PI * frequency * i as f32 / SAMPLE_RATE as f32)
        .map(|phase| amplitude * phase.sin())
        .collect();
    signal(samples)
}

/// Constant signal
pub fn dc(level: f32, num_samples: usize) -> Signal {
    signal(vec![level; num_samples])
}

/// Unit impulse followed by silence
pub fn impulse(num_samples: usize) -> Signal {
    let mut samples = vec![0.0; num_samples];
    if let Some(first) = samples.first_mut() {
        *first = 1.0;
    }
    signal(samples)
}

pub fn signal(samples: Vec<f32>) -> Signal {
    match Signal::new(samples, SAMPLE_RATE) {
        Ok(signal) => signal,
        Err(e) => panic!("generated signal rejected: {e}"),
    }
}

/// Sum of squares
pub fn energy(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s * s).sum()
}
