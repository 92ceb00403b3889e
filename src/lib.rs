//! Speech enhancement for spoken-audio recordings
//!
//! Removes background noise, keeps the 300-3400 Hz speech band, compresses
//! dynamic range and normalizes level, writing 16-bit PCM WAV.

pub mod audio_io;
pub mod batch;
pub mod config;
pub mod enhance;
pub mod error;

pub use batch::{run_batch, BatchReport};
pub use config::RunConfig;
pub use enhance::{enhance, EnhanceOptions, Enhancer, NoiseReducer, NoiseReduction};
pub use error::{EnhanceError, Result};
