//! Stationary spectral gating
//!
//! Estimates a per-bin noise threshold from the quietest frames of the
//! recording and gates STFT bins that do not rise above it.

use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use super::denoise::NoiseReducer;
use crate::error::{EnhanceError, Result};

/// Floor applied to bin magnitudes before taking dB
const MAGNITUDE_FLOOR: f32 = 1e-10;

/// Spectral gate noise reducer
pub struct SpectralGate {
    fft_size: usize,
    hop_size: usize,
    /// Standard deviations above the noise mean a bin must reach to pass
    n_std_thresh: f32,
    /// Fraction of the gated energy removed (1.0 = full gate)
    prop_decrease: f32,
    freq_smooth_hz: f32,
    time_smooth_ms: f32,
    forward_fft: Arc<dyn RealToComplex<f32>>,
    inverse_fft: Arc<dyn ComplexToReal<f32>>,
    window: Vec<f32>,
}

impl Default for SpectralGate {
    fn default() -> Self {
        Self::new(1024, 1.5, 1.0)
    }
}

impl SpectralGate {
    /// Create a new spectral gate
    ///
    /// # Arguments
    /// * `fft_size` - STFT size (hop is a quarter of it)
    /// * `n_std_thresh` - Threshold above the noise mean, in standard deviations
    /// * `prop_decrease` - How much of the gated energy to remove (0-1)
    pub fn new(fft_size: usize, n_std_thresh: f32, prop_decrease: f32) -> Self {
        let fft_size = fft_size.max(4);
        let hop_size = fft_size / 4; // 75% overlap

        let mut planner = RealFftPlanner::<f32>::new();
        let forward_fft = planner.plan_fft_forward(fft_size);
        let inverse_fft = planner.plan_fft_inverse(fft_size);

        // Periodic Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / fft_size as f32).cos())
            })
            .collect();

        Self {
            fft_size,
            hop_size,
            n_std_thresh,
            prop_decrease: prop_decrease.clamp(0.0, 1.0),
            freq_smooth_hz: 50.0,
            time_smooth_ms: 50.0,
            forward_fft,
            inverse_fft,
            window,
        }
    }

    /// Short-time spectra of the centred, zero-padded signal
    fn analyze(&self, samples: &[f32]) -> Result<Vec<Vec<Complex<f32>>>> {
        let pad = self.fft_size / 2;
        let padded_len = samples.len() + 2 * pad;
        let frame_count = 1 + (padded_len - self.fft_size + self.hop_size - 1) / self.hop_size;

        let mut padded = vec![0.0f32; (frame_count - 1) * self.hop_size + self.fft_size];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let mut frames = Vec::with_capacity(frame_count);
        let mut buffer = self.forward_fft.make_input_vec();

        for t in 0..frame_count {
            let start = t * self.hop_size;
            for ((dst, &s), &w) in buffer
                .iter_mut()
                .zip(&padded[start..start + self.fft_size])
                .zip(&self.window)
            {
                *dst = s * w;
            }

            let mut spectrum = self.forward_fft.make_output_vec();
            self.forward_fft
                .process(&mut buffer, &mut spectrum)
                .map_err(|e| EnhanceError::Denoise(format!("Forward FFT failed: {}", e)))?;
            frames.push(spectrum);
        }

        Ok(frames)
    }

    /// Weighted overlap-add back to a signal of `len` samples
    fn synthesize(&self, frames: Vec<Vec<Complex<f32>>>, len: usize) -> Result<Vec<f32>> {
        let pad = self.fft_size / 2;
        let total = (frames.len() - 1) * self.hop_size + self.fft_size;
        let mut output = vec![0.0f32; total];
        let mut window_sum = vec![0.0f32; total];
        let norm = 1.0 / self.fft_size as f32;
        let mut time_buffer = self.inverse_fft.make_output_vec();

        for (t, mut spectrum) in frames.into_iter().enumerate() {
            // DC and Nyquist must be purely real for the inverse transform
            if let Some(first) = spectrum.first_mut() {
                first.im = 0.0;
            }
            if let Some(last) = spectrum.last_mut() {
                last.im = 0.0;
            }

            self.inverse_fft
                .process(&mut spectrum, &mut time_buffer)
                .map_err(|e| EnhanceError::Denoise(format!("Inverse FFT failed: {}", e)))?;

            let start = t * self.hop_size;
            for (i, (&s, &w)) in time_buffer.iter().zip(&self.window).enumerate() {
                output[start + i] += s * norm * w;
                window_sum[start + i] += w * w;
            }
        }

        Ok(output[pad..pad + len]
            .iter()
            .zip(&window_sum[pad..pad + len])
            .map(|(&s, &w)| if w > 0.001 { s / w } else { 0.0 })
            .collect())
    }

    /// Per-bin gate threshold (dB) from the quietest 10% of frames
    fn noise_threshold(&self, levels: &[Vec<f32>], energies: &[f32]) -> Vec<f32> {
        let bins = self.fft_size / 2 + 1;

        let mut order: Vec<usize> = (0..energies.len()).collect();
        order.sort_by(|&a, &b| energies[a].total_cmp(&energies[b]));
        let quiet_count = (order.len() / 10).max(1);
        let quiet = &order[..quiet_count];

        let mut mean = vec![0.0f32; bins];
        for &t in quiet {
            for (m, &level) in mean.iter_mut().zip(&levels[t]) {
                *m += level;
            }
        }
        for m in mean.iter_mut() {
            *m /= quiet_count as f32;
        }

        let mut variance = vec![0.0f32; bins];
        for &t in quiet {
            for ((v, &level), &m) in variance.iter_mut().zip(&levels[t]).zip(&mean) {
                *v += (level - m) * (level - m);
            }
        }

        mean.iter()
            .zip(&variance)
            .map(|(&m, &v)| m + self.n_std_thresh * (v / quiet_count as f32).sqrt())
            .collect()
    }
}

impl NoiseReducer for SpectralGate {
    fn reduce(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let mut frames = self.analyze(samples)?;

        let levels: Vec<Vec<f32>> = frames
            .iter()
            .map(|spectrum| {
                spectrum
                    .iter()
                    .map(|c| 20.0 * c.norm().max(MAGNITUDE_FLOOR).log10())
                    .collect()
            })
            .collect();
        let energies: Vec<f32> = frames
            .iter()
            .map(|spectrum| spectrum.iter().map(|c| c.norm_sqr()).sum())
            .collect();

        let threshold = self.noise_threshold(&levels, &energies);

        let mut mask: Vec<Vec<f32>> = levels
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .zip(&threshold)
                    .map(|(&level, &thresh)| if level > thresh { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();

        let bin_hz = sample_rate.max(1) as f32 / self.fft_size as f32;
        let frame_ms = self.hop_size as f32 * 1000.0 / sample_rate.max(1) as f32;
        let freq_half = ((self.freq_smooth_hz / bin_hz).round() as usize) / 2;
        let time_half = ((self.time_smooth_ms / frame_ms).round() as usize) / 2;
        smooth_mask(&mut mask, freq_half, time_half);

        for (spectrum, gains) in frames.iter_mut().zip(&mask) {
            for (c, &m) in spectrum.iter_mut().zip(gains) {
                let gain = m * self.prop_decrease + (1.0 - self.prop_decrease);
                *c = *c * gain;
            }
        }

        log::debug!(
            "Spectral gate: {} frames, smoothing +/-{} bins, +/-{} frames",
            frames.len(),
            freq_half,
            time_half
        );

        self.synthesize(frames, samples.len())
    }

    fn name(&self) -> &'static str {
        "spectral"
    }
}

/// Separable box smoothing of a frames x bins mask
fn smooth_mask(mask: &mut [Vec<f32>], freq_half: usize, time_half: usize) {
    if freq_half > 0 {
        for frame in mask.iter_mut() {
            *frame = box_average(frame, freq_half);
        }
    }

    if time_half > 0 && !mask.is_empty() {
        let bins = mask[0].len();
        for b in 0..bins {
            let column: Vec<f32> = mask.iter().map(|frame| frame[b]).collect();
            for (frame, value) in mask.iter_mut().zip(box_average(&column, time_half)) {
                frame[b] = value;
            }
        }
    }
}

/// Centred moving average, window clipped at the edges
fn box_average(values: &[f32], half: usize) -> Vec<f32> {
    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push(0.0f32);
    for &v in values {
        let last = *prefix.last().unwrap_or(&0.0);
        prefix.push(last + v);
    }

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            (prefix[hi] - prefix[lo]) / (hi - lo) as f32
        })
        .collect()
}
