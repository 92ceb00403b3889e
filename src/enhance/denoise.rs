//! Noise reduction capability used as the first pipeline stage
//!
//! The pipeline only relies on the contract of [`NoiseReducer`]: same length
//! out as in, sample rate untouched. Implementations are free to do anything
//! else internally.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::neural::NeuralDenoiser;
use super::spectral::SpectralGate;
use crate::error::Result;

/// Removes stationary background noise from a mono waveform
pub trait NoiseReducer: Send + Sync {
    /// Return a denoised copy of `samples`, same length, same sample rate
    fn reduce(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>>;

    fn name(&self) -> &'static str;
}

/// Identity reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl NoiseReducer for Passthrough {
    fn reduce(&self, samples: &[f32], _sample_rate: u32) -> Result<Vec<f32>> {
        Ok(samples.to_vec())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Which noise reducer the pipeline runs
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoiseReduction {
    /// Stationary spectral gating
    #[default]
    Spectral,
    /// RNNoise
    Neural,
    None,
}

impl NoiseReduction {
    /// Build the reducer, sharing it across worker threads
    pub fn build(self, neural_strength: f32) -> Arc<dyn NoiseReducer> {
        match self {
            NoiseReduction::Spectral => Arc::new(SpectralGate::default()),
            NoiseReduction::Neural => Arc::new(NeuralDenoiser::new(neural_strength)),
            NoiseReduction::None => Arc::new(Passthrough),
        }
    }
}

impl std::str::FromStr for NoiseReduction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spectral" => Ok(NoiseReduction::Spectral),
            "neural" | "rnnoise" => Ok(NoiseReduction::Neural),
            "none" | "off" => Ok(NoiseReduction::None),
            other => Err(format!(
                "unknown noise reduction '{}', expected spectral, neural or none",
                other
            )),
        }
    }
}
