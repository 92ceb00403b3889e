//! Peak normalization and 16-bit PCM encoding

use crate::error::{EnhanceError, Result};

/// Full-scale value for signed 16-bit output
pub const PCM16_FULL_SCALE: f32 = 32767.0;

/// Rescales a waveform so its peak magnitude hits a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    target_peak: f32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { target_peak: 1.0 }
    }
}

impl Normalizer {
    /// Create a normalizer for a target peak in (0, 1]
    pub fn new(target_peak: f32) -> Result<Self> {
        if !target_peak.is_finite() || target_peak <= 0.0 || target_peak > 1.0 {
            return Err(EnhanceError::InvalidParameter(format!(
                "target peak must be in (0, 1], got {}",
                target_peak
            )));
        }
        Ok(Self { target_peak })
    }

    pub fn target_peak(&self) -> f32 {
        self.target_peak
    }

    /// Scale samples in-place
    ///
    /// Silent (or non-finite) input is left as is.
    pub fn process(&self, samples: &mut [f32]) {
        let peak = peak_amplitude(samples);
        if !peak.is_finite() || peak <= f32::MIN_POSITIVE {
            return;
        }

        let gain = self.target_peak / peak;
        if gain == 1.0 {
            return;
        }
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
}

/// Largest absolute sample value, 0.0 for an empty buffer
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}

/// Convert float samples to signed 16-bit PCM
///
/// Values are scaled by 32767, clamped to +/-32767 and truncated toward zero.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * PCM16_FULL_SCALE).clamp(-PCM16_FULL_SCALE, PCM16_FULL_SCALE) as i16)
        .collect()
}
