//! Duration-preserving pitch shift
//!
//! A shift by `n` semitones time-stretches the signal by `2^(-n/12)` with a
//! phase vocoder, then resamples the stretched signal back onto the original
//! number of samples. Stretching and resampling cancel in duration and
//! compound in pitch.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use crate::dsp::stft::{Spectrum, Stft, DEFAULT_HOP, DEFAULT_N_FFT};
use crate::engine::Waveform;
use crate::error::{PitchPageError, Result};

/// Semitones per octave
const BINS_PER_OCTAVE: f64 = 12.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Playback-rate factor for a shift of `steps` semitones
///
/// Positive steps give a rate below 1 (the stretch lengthens the signal
/// before it is squeezed back, raising pitch).
#[inline]
pub fn stretch_rate(steps: i32) -> f64 {
    2.0_f64.powf(-(steps as f64) / BINS_PER_OCTAVE)
}

/// Wrap a phase into `[-pi, pi]`
#[inline]
fn principal_angle(phase: f64) -> f64 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}

/// Phase vocoder: resample frames in time by `rate`
///
/// Magnitudes are interpolated between neighbouring frames while phase is
/// accumulated from the measured per-bin phase advance, so partials keep
/// their frequency while the frame count scales by `1 / rate`.
pub fn phase_vocoder(frames: &[Spectrum], rate: f64, hop: usize, n_fft: usize) -> Vec<Spectrum> {
    if frames.is_empty() {
        return Vec::new();
    }

    let num_bins = frames[0].len();
    let num_frames = frames.len();
    let zero_frame = vec![Complex::new(0.0_f32, 0.0); num_bins];

    // Expected phase advance per hop for the centre frequency of each bin
    let phase_advance: Vec<f64> = (0..num_bins)
        .map(|k| 2.0 * PI * hop as f64 * k as f64 / n_fft as f64)
        .collect();

    let mut phase_acc: Vec<f64> = frames[0].iter().map(|c| c.arg() as f64).collect();

    let mut output = Vec::with_capacity((num_frames as f64 / rate).ceil() as usize);
    let mut step = 0usize;
    loop {
        let t = step as f64 * rate;
        if t >= num_frames as f64 {
            break;
        }
        let idx = t.floor() as usize;
        let alpha = t - idx as f64;
        let left = frames.get(idx).unwrap_or(&zero_frame);
        let right = frames.get(idx + 1).unwrap_or(&zero_frame);

        let mut frame = Vec::with_capacity(num_bins);
        for k in 0..num_bins {
            let mag = (1.0 - alpha) * left[k].norm() as f64 + alpha * right[k].norm() as f64;
            frame.push(Complex::from_polar(mag as f32, phase_acc[k] as f32));

            let measured = right[k].arg() as f64 - left[k].arg() as f64 - phase_advance[k];
            phase_acc[k] += phase_advance[k] + principal_angle(measured);
        }
        output.push(frame);
        step += 1;
    }

    output
}

/// Linear interpolation resampling onto exactly `target_len` samples
///
/// Output sample `i` reads source position `i / ratio`; positions past the
/// end of the source read as silence.
pub fn resample_linear(samples: &[f32], ratio: f64, target_len: usize) -> Vec<f32> {
    let source_len = samples.len();
    (0..target_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let src_idx = src_pos.floor() as usize;
            let frac = (src_pos - src_idx as f64) as f32;

            if src_idx + 1 < source_len {
                samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
            } else if src_idx < source_len {
                samples[src_idx]
            } else {
                0.0
            }
        })
        .collect()
}

// ============================================================================
// Pitch Shifter
// ============================================================================

/// Phase-vocoder pitch shifter with pre-planned transforms
#[derive(Debug, Clone)]
pub struct PitchShifter {
    stft: Stft,
}

impl Default for PitchShifter {
    fn default() -> Self {
        PitchShifter::new(DEFAULT_N_FFT, DEFAULT_HOP)
    }
}

impl PitchShifter {
    pub fn new(n_fft: usize, hop: usize) -> Self {
        PitchShifter {
            stft: Stft::new(n_fft, hop),
        }
    }

    /// Change duration by `1 / rate` without changing pitch
    pub fn time_stretch(&self, samples: &[f32], rate: f64) -> Vec<f32> {
        let frames = self.stft.analyze(samples);
        let stretched = phase_vocoder(&frames, rate, self.stft.hop(), self.stft.n_fft());
        let length = (samples.len() as f64 / rate).round() as usize;
        self.stft.synthesize(&stretched, length)
    }

    /// Shift pitch by `steps` semitones, keeping the sample count
    ///
    /// # Errors
    /// * `Transform` - If the waveform has fewer than two samples
    pub fn shift(&self, waveform: &Waveform, steps: i32) -> Result<Waveform> {
        if waveform.len() < 2 {
            return Err(PitchPageError::transform(format!(
                "cannot pitch-shift a waveform of {} sample(s)",
                waveform.len()
            )));
        }
        if steps == 0 {
            return Ok(waveform.clone());
        }

        let rate = stretch_rate(steps);
        let stretched = self.time_stretch(waveform.samples(), rate);
        let shifted = resample_linear(&stretched, rate, waveform.len());

        log::debug!(
            "Shifted {} samples by {:+} semitones (rate {:.4}, stretched to {})",
            waveform.len(),
            steps,
            rate,
            stretched.len()
        );

        Waveform::new(shifted, waveform.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustfft::FftPlanner;

    /// Strongest frequency in the middle of the signal
    fn dominant_frequency(samples: &[f32], sample_rate: u32) -> f32 {
        let size = 8192;
        let start = (samples.len() - size) / 2;
        let window = crate::dsp::stft::hann_window(size);
        let mut buffer: Vec<Complex<f32>> = samples[start..start + size]
            .iter()
            .zip(&window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        FftPlanner::new().plan_fft_forward(size).process(&mut buffer);

        let (peak_bin, _) = buffer[..size / 2]
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.norm()))
            .fold((0, 0.0_f32), |best, cur| if cur.1 > best.1 { cur } else { best });
        peak_bin as f32 * sample_rate as f32 / size as f32
    }

    #[test]
    fn test_stretch_rate() {
        assert_relative_eq!(stretch_rate(0), 1.0);
        assert_relative_eq!(stretch_rate(12), 0.5);
        assert_relative_eq!(stretch_rate(-12), 2.0);
        assert_relative_eq!(stretch_rate(4), 0.7937005259840998, epsilon = 1e-12);
    }

    #[test]
    fn test_principal_angle() {
        assert_relative_eq!(principal_angle(2.5 * PI), 0.5 * PI, epsilon = 1e-9);
        assert_relative_eq!(principal_angle(0.5), 0.5);
        assert_relative_eq!(principal_angle(-2.0 * PI + 0.25), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_phase_vocoder_frame_count() {
        let frames = vec![vec![Complex::new(1.0_f32, 0.0); 5]; 10];
        assert_eq!(phase_vocoder(&frames, 0.5, 4, 8).len(), 20);
        assert_eq!(phase_vocoder(&frames, 2.0, 4, 8).len(), 5);
        assert_eq!(phase_vocoder(&frames, 1.0, 4, 8).len(), 10);
    }

    #[test]
    fn test_resample_linear_interpolates() {
        let resampled = resample_linear(&[0.0, 1.0, 0.0], 2.0, 6);
        assert_eq!(resampled.len(), 6);
        assert!((resampled[1] - 0.5).abs() < 1e-6);
        assert!((resampled[2] - 1.0).abs() < 1e-6);
        assert_eq!(resampled[5], 0.0);
    }

    #[test]
    fn test_time_stretch_length() {
        let shifter = PitchShifter::default();
        let tone = Waveform::sine(440.0, 0.5, 22050, 0.5).unwrap();
        let stretched = shifter.time_stretch(tone.samples(), 0.5);
        assert_eq!(stretched.len(), tone.len() * 2);
    }

    #[test]
    fn test_shift_preserves_length() {
        let shifter = PitchShifter::default();
        let tone = Waveform::sine(440.0, 0.75, 22050, 0.5).unwrap();
        for steps in [4, -3, 7, -12] {
            let shifted = shifter.shift(&tone, steps).unwrap();
            assert_eq!(shifted.len(), tone.len());
            assert_eq!(shifted.sample_rate(), tone.sample_rate());
            assert!(shifted.is_finite());
        }
    }

    #[test]
    fn test_octave_up_doubles_frequency() {
        let shifter = PitchShifter::default();
        let tone = Waveform::sine(441.0, 1.0, 22050, 0.5).unwrap();
        let shifted = shifter.shift(&tone, 12).unwrap();
        let freq = dominant_frequency(shifted.samples(), 22050);
        assert!((freq - 882.0).abs() < 15.0, "dominant frequency {}", freq);
    }

    #[test]
    fn test_octave_down_halves_frequency() {
        let shifter = PitchShifter::default();
        let tone = Waveform::sine(882.0, 1.0, 22050, 0.5).unwrap();
        let shifted = shifter.shift(&tone, -12).unwrap();
        let freq = dominant_frequency(shifted.samples(), 22050);
        assert!((freq - 441.0).abs() < 15.0, "dominant frequency {}", freq);
    }

    #[test]
    fn test_zero_steps_is_identity() {
        let shifter = PitchShifter::default();
        let tone = Waveform::sine(300.0, 0.1, 8000, 0.3).unwrap();
        assert_eq!(shifter.shift(&tone, 0).unwrap(), tone);
    }

    #[test]
    fn test_degenerate_waveforms_rejected() {
        let shifter = PitchShifter::default();
        for samples in [vec![], vec![0.5]] {
            let wave = Waveform::new(samples, 44100).unwrap();
            let err = shifter.shift(&wave, 4).unwrap_err();
            assert_eq!(err.error_code(), "TRANSFORM_ERROR");
        }
    }

    #[test]
    fn test_two_sample_waveform_shifts() {
        let shifter = PitchShifter::default();
        let wave = Waveform::new(vec![0.1, -0.1], 44100).unwrap();
        let shifted = shifter.shift(&wave, -3).unwrap();
        assert_eq!(shifted.len(), 2);
        assert!(shifted.is_finite());
    }
}
