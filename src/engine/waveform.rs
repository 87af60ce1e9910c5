//! Mono waveform type
//!
//! The audio effect works on a single channel of 32-bit float samples at the
//! clip's native sample rate. Multi-channel input is downmixed on decode.

use crate::error::{PitchPageError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Waveform
// ============================================================================

/// Ordered samples plus the rate they were captured at
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from raw samples
    ///
    /// # Errors
    /// * `Transform` - If the sample rate is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(PitchPageError::transform("sample rate must be positive"));
        }
        Ok(Waveform {
            samples,
            sample_rate,
        })
    }

    /// Create a silent waveform of the given duration
    pub fn silence(duration_secs: f64, sample_rate: u32) -> Result<Self> {
        let num_samples = (duration_secs * sample_rate as f64).round() as usize;
        Waveform::new(vec![0.0; num_samples], sample_rate)
    }

    /// Create a sine tone, mostly useful for tests and fixtures
    pub fn sine(frequency: f32, duration_secs: f64, sample_rate: u32, amplitude: f32) -> Result<Self> {
        let num_samples = (duration_secs * sample_rate as f64).round() as usize;
        let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
        let samples = (0..num_samples)
            .map(|i| amplitude * (angular_freq * i as f32).sin())
            .collect();
        Waveform::new(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// True when no sample is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    /// Absolute peak level in dB
    pub fn peak_db(&self) -> f32 {
        let peak = self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max);
        linear_to_db(peak)
    }

    /// RMS level in dB
    pub fn rms_db(&self) -> f32 {
        if self.samples.is_empty() {
            return f32::NEG_INFINITY;
        }
        let sum_squares: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        linear_to_db((sum_squares / self.samples.len() as f64).sqrt() as f32)
    }
}
