//! DSP for the voice effect
//!
//! STFT primitives, the phase-vocoder pitch shifter, and the layered mix
//! that combines shifted copies with the original clip.

mod mixer;
mod pitch_shift;
pub mod stft;

pub use mixer::{mix_truncated, process, ChorusEffect, MixPolicy, DEFAULT_PITCH_STEPS};
pub use pitch_shift::{phase_vocoder, resample_linear, stretch_rate, PitchShifter};
pub use stft::Stft;
