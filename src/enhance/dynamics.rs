//! Static dynamic range compression in the decibel domain
//!
//! Each sample is compressed independently from its own instantaneous level;
//! there is no envelope follower, attack/release or look-ahead.

use crate::error::{EnhanceError, Result};

/// Smallest magnitude considered signal (-100 dB re 1.0)
///
/// Anything at or below this is silence: it is floored before the logarithm
/// and never altered by the compressor.
pub const AMPLITUDE_FLOOR: f32 = 1e-5;

/// Default compression threshold in dB
pub const DEFAULT_THRESHOLD_DB: f32 = -30.0;
/// Default compression ratio
pub const DEFAULT_RATIO: f32 = 4.0;

/// Magnitude in dB relative to full scale, floored at [`AMPLITUDE_FLOOR`]
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.abs().max(AMPLITUDE_FLOOR).log10()
}

pub fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Decibel view of a waveform
///
/// Holds per-sample levels alongside the polarity needed to rebuild the
/// linear signal. Only lives for the duration of a compression pass.
struct DecibelBuffer {
    levels: Vec<f32>,
    negative: Vec<bool>,
}

impl DecibelBuffer {
    fn from_amplitudes(samples: &[f32]) -> Self {
        Self {
            levels: samples.iter().map(|&s| amplitude_to_db(s)).collect(),
            negative: samples.iter().map(|&s| s.is_sign_negative()).collect(),
        }
    }

    fn to_amplitudes(&self) -> Vec<f32> {
        self.levels
            .iter()
            .zip(&self.negative)
            .map(|(&db, &negative)| {
                let magnitude = db_to_amplitude(db);
                if negative {
                    -magnitude
                } else {
                    magnitude
                }
            })
            .collect()
    }
}

/// Sample-wise compressor above a dB threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicRangeCompressor {
    threshold_db: f32,
    ratio: f32,
}

impl Default for DynamicRangeCompressor {
    fn default() -> Self {
        Self {
            threshold_db: DEFAULT_THRESHOLD_DB,
            ratio: DEFAULT_RATIO,
        }
    }
}

impl DynamicRangeCompressor {
    /// Create a compressor
    ///
    /// # Arguments
    /// * `threshold_db` - Level above which samples are compressed
    /// * `ratio` - Compression ratio, larger is stronger (must be > 0)
    pub fn new(threshold_db: f32, ratio: f32) -> Result<Self> {
        if !threshold_db.is_finite() {
            return Err(EnhanceError::InvalidParameter(format!(
                "compression threshold must be finite, got {}",
                threshold_db
            )));
        }
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(EnhanceError::InvalidParameter(format!(
                "compression ratio must be positive, got {}",
                ratio
            )));
        }
        Ok(Self { threshold_db, ratio })
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Compress a waveform, returning a new buffer of the same length
    ///
    /// Levels above the threshold become `threshold + (level - threshold) / ratio`.
    /// Samples at or below the threshold, and silence, are copied unchanged.
    pub fn process(&self, samples: &[f32]) -> Vec<f32> {
        let mut db = DecibelBuffer::from_amplitudes(samples);
        let mut touched = vec![false; samples.len()];

        for ((level, flag), &sample) in db.levels.iter_mut().zip(touched.iter_mut()).zip(samples) {
            if sample.abs() > AMPLITUDE_FLOOR && *level > self.threshold_db {
                *level = self.threshold_db + (*level - self.threshold_db) / self.ratio;
                *flag = true;
            }
        }

        db.to_amplitudes()
            .into_iter()
            .zip(touched)
            .zip(samples)
            .map(|((compressed, flag), &original)| if flag { compressed } else { original })
            .collect()
    }
}
