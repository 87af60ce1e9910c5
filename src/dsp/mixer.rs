//! Layered pitch-shift mix ("chorus" voice effect)
//!
//! Every layer is shifted from the untouched original, never from a previous
//! layer, so the result does not depend on the order of the steps.

use serde::{Deserialize, Serialize};

use crate::dsp::pitch_shift::PitchShifter;
use crate::engine::Waveform;
use crate::error::{PitchPageError, Result};

/// Semitone steps layered on top of the original voice
pub const DEFAULT_PITCH_STEPS: [i32; 2] = [4, -3];

/// How the original and shifted layers are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixPolicy {
    /// `original + shift(s0) + shift(s1) + ...`
    #[default]
    DirectSum,
    /// Direct sum divided by the number of layers (ffmpeg `amix` behaviour)
    Averaged,
}

/// Sum operands sample-wise after truncating all of them to the shortest
pub fn mix_truncated(layers: &[Vec<f32>]) -> Vec<f32> {
    let Some(len) = layers.iter().map(Vec::len).min() else {
        return Vec::new();
    };

    let mut mixed = vec![0.0_f32; len];
    for layer in layers {
        for (out, &sample) in mixed.iter_mut().zip(&layer[..len]) {
            *out += sample;
        }
    }
    mixed
}

/// The voice effect: original plus one pitch-shifted copy per step
#[derive(Debug, Clone)]
pub struct ChorusEffect {
    steps: Vec<i32>,
    policy: MixPolicy,
    shifter: PitchShifter,
}

impl Default for ChorusEffect {
    fn default() -> Self {
        ChorusEffect::new(DEFAULT_PITCH_STEPS.to_vec(), MixPolicy::default())
    }
}

impl ChorusEffect {
    pub fn new(steps: Vec<i32>, policy: MixPolicy) -> Self {
        ChorusEffect {
            steps,
            policy,
            shifter: PitchShifter::default(),
        }
    }

    /// Replace the pitch shifter (e.g. a smaller FFT for short clips)
    pub fn with_shifter(mut self, shifter: PitchShifter) -> Self {
        self.shifter = shifter;
        self
    }

    pub fn steps(&self) -> &[i32] {
        &self.steps
    }

    pub fn policy(&self) -> MixPolicy {
        self.policy
    }

    /// Apply the effect
    ///
    /// With no steps the input comes back unchanged. Output length is the
    /// shortest of the original and every shifted layer.
    ///
    /// # Errors
    /// * `Transform` - If a layer cannot be shifted (fewer than two samples)
    ///   or the mix produced NaN/Inf
    pub fn process(&self, waveform: &Waveform) -> Result<Waveform> {
        if self.steps.is_empty() {
            return Ok(waveform.clone());
        }

        let mut layers = Vec::with_capacity(self.steps.len() + 1);
        layers.push(waveform.samples().to_vec());
        for &steps in &self.steps {
            layers.push(self.shifter.shift(waveform, steps)?.into_samples());
        }

        let mut mixed = mix_truncated(&layers);
        if self.policy == MixPolicy::Averaged {
            let gain = 1.0 / layers.len() as f32;
            mixed.iter_mut().for_each(|s| *s *= gain);
        }

        let result = Waveform::new(mixed, waveform.sample_rate())?;
        if !result.is_finite() {
            return Err(PitchPageError::transform("mix produced non-finite samples"));
        }

        log::debug!(
            "Mixed {} layers ({:?}) into {} samples, peak {:.1} dB",
            layers.len(),
            self.policy,
            result.len(),
            result.peak_db()
        );

        Ok(result)
    }
}

/// Apply the layered pitch-shift mix to raw samples
///
/// Convenience form of [`ChorusEffect::process`] with the direct-sum policy.
pub fn process(samples: &[f32], sample_rate: u32, steps: &[i32]) -> Result<Vec<f32>> {
    let waveform = Waveform::new(samples.to_vec(), sample_rate)?;
    ChorusEffect::new(steps.to_vec(), MixPolicy::DirectSum)
        .process(&waveform)
        .map(Waveform::into_samples)
}
