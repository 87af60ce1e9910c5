//! Short-time Fourier transform
//!
//! Centered STFT with a periodic Hann window, plus the matching
//! overlap-add inverse. Frames hold the non-negative frequency bins only
//! (`n_fft / 2 + 1` per frame).

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Default analysis window length
pub const DEFAULT_N_FFT: usize = 2048;

/// Default hop between frames (a quarter window)
pub const DEFAULT_HOP: usize = 512;

/// One analysis frame of positive-frequency bins
pub type Spectrum = Vec<Complex<f32>>;

/// Periodic Hann window of the given length
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / len as f32).cos()))
        .collect()
}

/// Planned forward/inverse transforms for a fixed window and hop
#[derive(Clone)]
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop", &self.hop)
            .finish()
    }
}

impl Stft {
    /// Plan transforms for `n_fft`-sample windows spaced `hop` apart
    ///
    /// `n_fft` must be even and `hop` must be in `1..=n_fft`.
    pub fn new(n_fft: usize, hop: usize) -> Self {
        debug_assert!(n_fft >= 2 && n_fft % 2 == 0);
        debug_assert!(hop >= 1 && hop <= n_fft);

        let mut planner = FftPlanner::new();
        Stft {
            n_fft,
            hop,
            window: hann_window(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of positive-frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Analyze a signal into frames
    ///
    /// The signal is zero-padded by half a window on both sides so that
    /// frame `t` is centered on sample `t * hop`.
    pub fn analyze(&self, signal: &[f32]) -> Vec<Spectrum> {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0_f32; signal.len() + 2 * pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let num_frames = 1 + (padded.len() - self.n_fft) / self.hop;
        let mut buffer = vec![Complex::new(0.0_f32, 0.0); self.n_fft];

        (0..num_frames)
            .map(|t| {
                let start = t * self.hop;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
                }
                self.forward.process(&mut buffer);
                buffer[..self.num_bins()].to_vec()
            })
            .collect()
    }

    /// Overlap-add frames back into a signal of exactly `length` samples
    ///
    /// The result is normalized by the summed squared window, so analysis
    /// followed by synthesis reconstructs the input.
    pub fn synthesize(&self, frames: &[Spectrum], length: usize) -> Vec<f32> {
        if frames.is_empty() {
            return vec![0.0; length];
        }

        let n = self.n_fft;
        let half = n / 2;
        let total = n + self.hop * (frames.len() - 1);
        let mut output = vec![0.0_f32; total];
        let mut window_sum = vec![0.0_f32; total];
        let mut buffer = vec![Complex::new(0.0_f32, 0.0); n];
        let scale = 1.0 / n as f32;

        for (t, frame) in frames.iter().enumerate() {
            // Rebuild the Hermitian-symmetric full spectrum
            buffer[0] = Complex::new(frame[0].re, 0.0);
            for k in 1..half {
                buffer[k] = frame[k];
                buffer[n - k] = frame[k].conj();
            }
            buffer[half] = Complex::new(frame[half].re, 0.0);

            self.inverse.process(&mut buffer);

            let start = t * self.hop;
            for i in 0..n {
                let w = self.window[i];
                output[start + i] += buffer[i].re * scale * w;
                window_sum[start + i] += w * w;
            }
        }

        for (sample, &norm) in output.iter_mut().zip(&window_sum) {
            if norm > f32::MIN_POSITIVE {
                *sample /= norm;
            }
        }

        let mut trimmed: Vec<f32> = output.into_iter().skip(half).take(length).collect();
        trimmed.resize(length, 0.0);
        trimmed
    }
}
