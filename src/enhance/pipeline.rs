//! Speech enhancement pipeline orchestration
//!
//! Runs the stages in a fixed order: noise reduction, speech-band filter,
//! dynamic range compression, peak normalization.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::denoise::{NoiseReducer, NoiseReduction};
use super::dynamics::{DynamicRangeCompressor, DEFAULT_RATIO, DEFAULT_THRESHOLD_DB};
use super::filters::{lfilter, speech_band, SPEECH_FILTER_ORDER};
use super::normalize::Normalizer;
use crate::error::{EnhanceError, Result};

/// Options controlling the enhancement stages
///
/// The speech band itself (300-3400 Hz, order 5) is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhanceOptions {
    /// Compression threshold (dB)
    pub threshold_db: f32,
    /// Compression ratio (> 0)
    pub ratio: f32,
    /// Peak level after normalization (0-1]
    pub target_peak: f32,
    /// Noise reducer used for the first stage
    pub noise_reduction: NoiseReduction,
    /// Dry/wet blend for the neural reducer (0-1)
    pub neural_strength: f32,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            threshold_db: DEFAULT_THRESHOLD_DB,
            ratio: DEFAULT_RATIO,
            target_peak: 1.0,
            noise_reduction: NoiseReduction::Spectral,
            neural_strength: 1.0,
        }
    }
}

impl EnhanceOptions {
    pub fn validate(&self) -> Result<()> {
        DynamicRangeCompressor::new(self.threshold_db, self.ratio)?;
        Normalizer::new(self.target_peak)?;
        if !(0.0..=1.0).contains(&self.neural_strength) {
            return Err(EnhanceError::InvalidParameter(format!(
                "neural strength must be in [0, 1], got {}",
                self.neural_strength
            )));
        }
        Ok(())
    }

    /// Load options from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&text)
            .map_err(|e| EnhanceError::Config(format!("{}: {}", path.display(), e)))?;
        options.validate()?;
        Ok(options)
    }
}

/// Enhance one mono waveform
///
/// Parameters are validated and the band-pass filter is designed before any
/// sample is touched. The result has the same length as `samples`.
pub fn enhance(
    samples: &[f32],
    sample_rate: u32,
    reducer: &dyn NoiseReducer,
    options: &EnhanceOptions,
) -> Result<Vec<f32>> {
    let compressor = DynamicRangeCompressor::new(options.threshold_db, options.ratio)?;
    let normalizer = Normalizer::new(options.target_peak)?;
    let band = speech_band(sample_rate as f64)?;

    log::debug!(
        "Enhancing {} samples at {} Hz (reducer={}, band order {})",
        samples.len(),
        sample_rate,
        reducer.name(),
        SPEECH_FILTER_ORDER
    );

    // Stage 1: noise reduction
    let denoised = reducer.reduce(samples, sample_rate)?;
    if denoised.len() != samples.len() {
        return Err(EnhanceError::Denoise(format!(
            "{} reducer changed length {} -> {}",
            reducer.name(),
            samples.len(),
            denoised.len()
        )));
    }

    // Stage 2: speech-band filter
    let filtered = lfilter(&band, &denoised);

    // Stage 3: dynamic range compression
    let mut compressed = compressor.process(&filtered);

    // Stage 4: peak normalization
    normalizer.process(&mut compressed);

    Ok(compressed)
}

/// Options plus the reducer they select, shareable across workers
#[derive(Clone)]
pub struct Enhancer {
    options: EnhanceOptions,
    reducer: Arc<dyn NoiseReducer>,
}

impl Enhancer {
    pub fn new(options: EnhanceOptions) -> Result<Self> {
        options.validate()?;
        let reducer = options.noise_reduction.build(options.neural_strength);
        Ok(Self { options, reducer })
    }

    /// Use a caller-supplied reducer instead of the one the options name
    pub fn with_reducer(options: EnhanceOptions, reducer: Arc<dyn NoiseReducer>) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, reducer })
    }

    pub fn options(&self) -> &EnhanceOptions {
        &self.options
    }

    pub fn reducer_name(&self) -> &'static str {
        self.reducer.name()
    }

    pub fn process(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        enhance(samples, sample_rate, self.reducer.as_ref(), &self.options)
    }
}
