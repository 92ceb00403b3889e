//! Neural denoising using RNNoise via nnnoiseless
//!
//! RNNoise runs at 48 kHz on 480-sample frames, so other rates are
//! resampled on the way in and out.

use nnnoiseless::DenoiseState;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::denoise::NoiseReducer;
use crate::error::{EnhanceError, Result};

/// RNNoise frame size (fixed at 480 samples at 48kHz = 10ms)
const RNNOISE_FRAME_SIZE: usize = 480;
/// RNNoise sample rate (fixed at 48kHz)
const RNNOISE_SAMPLE_RATE: u32 = 48000;
/// RNNoise works on 16-bit sample magnitudes
const RNNOISE_SCALE: f32 = 32767.0;

/// Neural denoiser wrapper around nnnoiseless
#[derive(Debug, Clone, Copy)]
pub struct NeuralDenoiser {
    strength: f32,
}

impl NeuralDenoiser {
    /// Create a new neural denoiser
    ///
    /// `strength` blends between dry (0.0) and fully denoised (1.0) output.
    pub fn new(strength: f32) -> Self {
        Self {
            strength: if strength.is_finite() {
                strength.clamp(0.0, 1.0)
            } else {
                1.0
            },
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    fn resample(&self, samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let ratio = to_rate as f64 / from_rate as f64;

        let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
            .map_err(|e| EnhanceError::Denoise(format!("Failed to create resampler: {}", e)))?;

        let input = vec![samples.to_vec()];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| {
                EnhanceError::Denoise(format!(
                    "Failed to resample {} Hz -> {} Hz: {}",
                    from_rate, to_rate, e
                ))
            })?;

        Ok(resampled.into_iter().next().unwrap_or_default())
    }

    /// Run 48 kHz audio through RNNoise, frame by frame
    fn run_rnnoise(&self, samples: &[f32]) -> Vec<f32> {
        let mut state = DenoiseState::new();
        let mut output = Vec::with_capacity(samples.len());

        let mut input_frame = [0.0f32; RNNOISE_FRAME_SIZE];
        let mut output_frame = [0.0f32; RNNOISE_FRAME_SIZE];

        for chunk in samples.chunks(RNNOISE_FRAME_SIZE) {
            // Zero-pad the final partial frame
            input_frame.fill(0.0);
            for (dst, &s) in input_frame.iter_mut().zip(chunk) {
                *dst = s * RNNOISE_SCALE;
            }

            state.process_frame(&mut output_frame, &input_frame);

            output.extend(output_frame[..chunk.len()].iter().map(|s| s / RNNOISE_SCALE));
        }

        output
    }
}

impl NoiseReducer for NeuralDenoiser {
    fn reduce(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        if samples.is_empty() || self.strength <= 0.0 {
            return Ok(samples.to_vec());
        }
        if sample_rate == 0 {
            return Err(EnhanceError::InvalidParameter(
                "sample rate must be positive".to_string(),
            ));
        }

        let needs_resample = sample_rate != RNNOISE_SAMPLE_RATE;

        let samples_48k = if needs_resample {
            self.resample(samples, sample_rate, RNNOISE_SAMPLE_RATE)?
        } else {
            samples.to_vec()
        };

        let denoised_48k = self.run_rnnoise(&samples_48k);

        let mut denoised = if needs_resample {
            self.resample(&denoised_48k, RNNOISE_SAMPLE_RATE, sample_rate)?
        } else {
            denoised_48k
        };
        denoised.resize(samples.len(), 0.0);

        Ok(samples
            .iter()
            .zip(&denoised)
            .map(|(&dry, &wet)| dry * (1.0 - self.strength) + wet * self.strength)
            .collect())
    }

    fn name(&self) -> &'static str {
        "neural"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neural_denoiser_creation() {
        let denoiser = NeuralDenoiser::new(0.8);
        assert!((denoiser.strength() - 0.8).abs() < 0.01);
        assert_eq!(NeuralDenoiser::new(3.0).strength(), 1.0);
        assert_eq!(NeuralDenoiser::new(f32::NAN).strength(), 1.0);
    }

    #[test]
    fn test_neural_denoiser_48k() {
        // 48kHz input needs no resampling
        let denoiser = NeuralDenoiser::new(1.0);
        let samples: Vec<f32> = (0..4800).map(|i| 0.1 * (i as f32 * 0.05).sin()).collect();
        let out = denoiser.reduce(&samples, 48000).unwrap();
        assert_eq!(out.len(), samples.len());
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_neural_denoiser_resampled_length() {
        let denoiser = NeuralDenoiser::new(1.0);
        let samples: Vec<f32> = (0..16000).map(|i| 0.1 * (i as f32 * 0.2).sin()).collect();
        let out = denoiser.reduce(&samples, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn test_neural_denoiser_zero_strength() {
        let denoiser = NeuralDenoiser::new(0.0);
        let original = vec![0.5f32; 1000];
        let out = denoiser.reduce(&original, 44100).unwrap();
        assert_eq!(out, original);
    }
}
