//! Batch driver: enhance every WAV file in a directory
//!
//! Files are independent, so they run on a bounded pool of blocking workers.
//! A failure on one file is logged and recorded; the rest of the batch
//! carries on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::audio_io::{decode_mono, write_pcm16};
use crate::config::RunConfig;
use crate::enhance::{to_pcm16, Enhancer};
use crate::error::{EnhanceError, Result};

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written
    pub processed: Vec<PathBuf>,
    /// Input files that could not be enhanced
    pub failed: Vec<(PathBuf, EnhanceError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// List `.wav` files (case-insensitive) directly inside `dir`, sorted by name
pub fn list_wav_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("wav"));

        if is_wav && path.is_file() {
            inputs.push(path);
        } else {
            log::debug!("Skipping {}", path.display());
        }
    }

    inputs.sort();
    Ok(inputs)
}

/// Enhance one file into `output_dir`, keeping its file name
///
/// Nothing is written unless decoding and every pipeline stage succeed.
pub fn process_file(input: &Path, output_dir: &Path, enhancer: &Enhancer) -> Result<PathBuf> {
    let file_name = input.file_name().ok_or_else(|| {
        EnhanceError::InvalidParameter(format!("not a file path: {}", input.display()))
    })?;
    let output = output_dir.join(file_name);

    let audio = decode_mono(input)?;
    let enhanced = enhancer.process(&audio.samples, audio.sample_rate)?;
    write_pcm16(&output, &to_pcm16(&enhanced), audio.sample_rate)?;

    log::info!("Processed: {}", file_name.to_string_lossy());
    Ok(output)
}

/// Enhance every WAV file in the configured input directory
///
/// Fails only when the batch cannot start (bad configuration, unreadable
/// input directory, output directory not creatable).
pub async fn run_batch(config: &RunConfig, enhancer: Enhancer) -> Result<BatchReport> {
    config.validate()?;
    std::fs::create_dir_all(&config.output_dir)?;

    let inputs = list_wav_inputs(&config.input_dir)?;
    log::info!(
        "Enhancing {} file(s) from {} into {} ({} worker(s), noise reduction: {})",
        inputs.len(),
        config.input_dir.display(),
        config.output_dir.display(),
        config.jobs,
        enhancer.reducer_name()
    );

    let semaphore = Arc::new(Semaphore::new(config.jobs));
    let enhancer = Arc::new(enhancer);
    let mut handles = Vec::with_capacity(inputs.len());

    for input in inputs {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| EnhanceError::Worker(e.to_string()))?;
        let enhancer = enhancer.clone();
        let output_dir = config.output_dir.clone();
        let path = input.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            process_file(&path, &output_dir, &enhancer)
        });
        handles.push((input, handle));
    }

    let mut report = BatchReport::default();
    for (input, handle) in handles {
        let result = handle
            .await
            .unwrap_or_else(|e| Err(EnhanceError::Worker(e.to_string())));

        match result {
            Ok(output) => report.processed.push(output),
            Err(e) => {
                log::warn!("Failed: {}: {}", input.display(), e);
                report.failed.push((input, e));
            }
        }
    }

    log::info!(
        "Batch complete: {} processed, {} failed",
        report.processed.len(),
        report.failed.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::{EnhanceOptions, NoiseReduction};
    use hound::{WavSpec, WavWriter};

    fn options_without_denoise() -> EnhanceOptions {
        EnhanceOptions {
            noise_reduction: NoiseReduction::None,
            ..EnhanceOptions::default()
        }
    }

    /// Write a half-second mono 16-bit tone
    fn write_tone(path: &Path, sample_rate: u32, freq: f32) {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..sample_rate / 2 {
            let t = i as f32 / sample_rate as f32;
            let s = 0.4 * (2.0 * std::f32::consts::PI * freq * t).sin();
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn read_samples(path: &Path) -> (WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_list_wav_inputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"").unwrap();
        std::fs::write(dir.path().join("B.WAV"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(dir.path().join("wav"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested.wav")).unwrap();

        let inputs = list_wav_inputs(dir.path()).unwrap();
        let names: Vec<String> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["B.WAV".to_string(), "a.wav".to_string()]);
    }

    #[tokio::test]
    async fn test_batch_processes_all_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let output_dir = output.path().join("enhanced");
        write_tone(&input.path().join("one.wav"), 16000, 440.0);
        write_tone(&input.path().join("two.wav"), 22050, 1000.0);
        std::fs::write(input.path().join("readme.txt"), b"skip me").unwrap();

        let config = RunConfig::new(input.path(), &output_dir).with_options(options_without_denoise());
        let enhancer = Enhancer::new(config.options.clone()).unwrap();
        let report = run_batch(&config, enhancer).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.processed.len(), 2);

        let (spec, samples) = read_samples(&output_dir.join("two.wav"));
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(samples.len(), 11025);
        let peak = samples.iter().map(|s| (*s as i32).abs()).max().unwrap();
        assert!(peak <= 32767 && peak > 32000);

        assert!(!output_dir.join("readme.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_file_does_not_affect_others() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let reference = tempfile::tempdir().unwrap();

        std::fs::write(input.path().join("a.wav"), b"RIFF garbage").unwrap();
        write_tone(&input.path().join("b.wav"), 16000, 800.0);

        let config = RunConfig::new(input.path(), output.path()).with_options(options_without_denoise());
        let report = run_batch(&config, Enhancer::new(config.options.clone()).unwrap())
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("a.wav"));
        assert!(report.failed[0].1.is_io());
        assert_eq!(report.processed, vec![output.path().join("b.wav")]);
        assert!(!output.path().join("a.wav").exists());

        // Same file on its own gives identical output
        let enhancer = Enhancer::new(options_without_denoise()).unwrap();
        process_file(&input.path().join("b.wav"), reference.path(), &enhancer).unwrap();
        assert_eq!(
            read_samples(&output.path().join("b.wav")).1,
            read_samples(&reference.path().join("b.wav")).1
        );
    }

    #[tokio::test]
    async fn test_unsupported_rate_fails_only_that_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        // 3400 Hz is above Nyquist at 6 kHz
        write_tone(&input.path().join("low.wav"), 6000, 500.0);
        write_tone(&input.path().join("ok.wav"), 8000, 500.0);

        let config = RunConfig::new(input.path(), output.path()).with_options(options_without_denoise());
        let report = run_batch(&config, Enhancer::new(config.options.clone()).unwrap())
            .await
            .unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].1, EnhanceError::InvalidParameter(_)));
        assert!(output.path().join("ok.wav").exists());
        assert!(!output.path().join("low.wav").exists());
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let input = tempfile::tempdir().unwrap();
        let sequential = tempfile::tempdir().unwrap();
        let parallel = tempfile::tempdir().unwrap();
        for (i, freq) in [300.0, 700.0, 1200.0, 2500.0].iter().enumerate() {
            write_tone(&input.path().join(format!("clip{}.wav", i)), 16000, *freq);
        }

        let options = EnhanceOptions::default();
        let seq_config = RunConfig::new(input.path(), sequential.path()).with_options(options.clone());
        let par_config = RunConfig::new(input.path(), parallel.path())
            .with_options(options.clone())
            .with_jobs(3);

        let seq = run_batch(&seq_config, Enhancer::new(options.clone()).unwrap()).await.unwrap();
        let par = run_batch(&par_config, Enhancer::new(options).unwrap()).await.unwrap();
        assert_eq!(seq.processed.len(), 4);
        assert_eq!(par.processed.len(), 4);

        for i in 0..4 {
            let name = format!("clip{}.wav", i);
            assert_eq!(
                read_samples(&sequential.path().join(&name)).1,
                read_samples(&parallel.path().join(&name)).1
            );
        }
    }

    #[tokio::test]
    async fn test_missing_input_dir() {
        let output = tempfile::tempdir().unwrap();
        let config = RunConfig::new(output.path().join("does-not-exist"), output.path().join("out"));
        let result = run_batch(&config, Enhancer::new(EnhanceOptions::default()).unwrap()).await;
        assert!(matches!(result, Err(EnhanceError::Io(_))));
    }

    #[tokio::test]
    async fn test_empty_input_dir() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let config = RunConfig::new(input.path(), output.path());
        let report = run_batch(&config, Enhancer::new(EnhanceOptions::default()).unwrap())
            .await
            .unwrap();
        assert!(report.is_success());
        assert!(report.processed.is_empty());
    }
}
