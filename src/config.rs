//! Per-invocation run configuration

use std::path::{Path, PathBuf};

use crate::enhance::EnhanceOptions;
use crate::error::{EnhanceError, Result};

pub const DEFAULT_INPUT_DIR: &str = "input_audio_files";
pub const DEFAULT_OUTPUT_DIR: &str = "enhanced_audio_files";

/// Everything one batch run needs
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Number of files processed concurrently
    pub jobs: usize,
    pub options: EnhanceOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            jobs: 1,
            options: EnhanceOptions::default(),
        }
    }
}

impl RunConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_options(mut self, options: EnhanceOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the enhancement options with those from a JSON file
    pub fn load_options(mut self, path: &Path) -> Result<Self> {
        self.options = EnhanceOptions::from_json_file(path)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(EnhanceError::InvalidParameter(
                "jobs must be at least 1".to_string(),
            ));
        }
        if self.input_dir == self.output_dir {
            return Err(EnhanceError::InvalidParameter(format!(
                "input and output directory are the same: {}",
                self.input_dir.display()
            )));
        }
        self.options.validate()
    }
}
