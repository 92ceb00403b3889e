//! Speech enhancement pipeline
//!
//! Four stages applied to a whole mono buffer:
//! 1. Noise reduction (spectral gate, RNNoise, or none)
//! 2. Speech-band IIR filter (Butterworth, 300-3400 Hz)
//! 3. Static dynamic range compression in dB
//! 4. Peak normalization

pub mod denoise;
pub mod dynamics;
pub mod filters;
pub mod neural;
pub mod normalize;
pub mod pipeline;
pub mod spectral;

pub use denoise::{NoiseReducer, NoiseReduction, Passthrough};
pub use normalize::to_pcm16;
pub use pipeline::{enhance, EnhanceOptions, Enhancer};
