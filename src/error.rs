//! Error types for the enhancer

use thiserror::Error;

/// Errors raised while enhancing a recording or running a batch
#[derive(Error, Debug)]
pub enum EnhanceError {
    /// Filter cutoffs or enhancement options out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// Decodable container but nothing usable inside it
    #[error("Unsupported audio: {0}")]
    UnsupportedAudio(String),

    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Noise reduction failed: {0}")]
    Denoise(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A batch worker panicked or was cancelled
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl EnhanceError {
    /// True for failures reading or writing audio files
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            EnhanceError::Io(_)
                | EnhanceError::Decode(_)
                | EnhanceError::UnsupportedAudio(_)
                | EnhanceError::Wav(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EnhanceError>;
