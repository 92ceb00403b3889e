//! speech-enhancer - batch speech enhancement for WAV recordings

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use speech_enhancer::config::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use speech_enhancer::{run_batch, BatchReport, Enhancer, NoiseReduction, Result, RunConfig};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "speech-enhancer")]
#[command(about = "Denoise, band-limit, compress and normalize speech recordings")]
#[command(version)]
struct Args {
    /// Directory containing .wav recordings
    #[arg(short, long, default_value = DEFAULT_INPUT_DIR, env = "SPEECH_ENHANCER_INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory for enhanced recordings (created if missing)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, env = "SPEECH_ENHANCER_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Number of files processed concurrently
    #[arg(short, long, default_value_t = 1, env = "SPEECH_ENHANCER_JOBS")]
    jobs: usize,

    /// JSON file with enhancement options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Noise reducer: spectral, neural or none
    #[arg(long)]
    noise_reduction: Option<NoiseReduction>,

    /// Compression threshold in dB
    #[arg(long, allow_negative_numbers = true)]
    threshold_db: Option<f32>,

    /// Compression ratio
    #[arg(long)]
    ratio: Option<f32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match run(args).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            for (path, err) in &report.failed {
                log::error!("{}: {}", path.display(), err);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<BatchReport> {
    let mut config = RunConfig::new(args.input_dir, args.output_dir).with_jobs(args.jobs);

    // File first, flags override
    if let Some(path) = &args.config {
        config = config.load_options(path)?;
    }
    if let Some(noise_reduction) = args.noise_reduction {
        config.options.noise_reduction = noise_reduction;
    }
    if let Some(threshold_db) = args.threshold_db {
        config.options.threshold_db = threshold_db;
    }
    if let Some(ratio) = args.ratio {
        config.options.ratio = ratio;
    }

    let enhancer = Enhancer::new(config.options.clone())?;
    run_batch(&config, enhancer).await
}
