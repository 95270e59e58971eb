mod image_file;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use gauss_blur_core::blurring::domain::blur_config::{BlurConfig, MaskProfile};
use gauss_blur_core::pipeline::blur_engine::BlurEngine;
use gauss_blur_core::pipeline::run_logger::StdoutRunLogger;
use gauss_blur_core::shared::constants::DEFAULT_PROGRESS_INTERVAL;

/// Multi-threaded Gaussian blur for images.
#[derive(Parser)]
#[command(name = "gauss-blur")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Output image file (format taken from the extension).
    output: PathBuf,

    /// JSON file with a blur configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gaussian mask size (must be odd).
    #[arg(long)]
    mask_size: Option<usize>,

    /// Blur intensity (scales sigma of the Gaussian mask).
    #[arg(long)]
    blur_level: Option<f64>,

    /// Number of blur passes.
    #[arg(long)]
    iterations: Option<usize>,

    /// Number of worker threads (row partitions).
    #[arg(long)]
    threads: Option<usize>,

    /// Mask profile.
    #[arg(long, value_enum)]
    profile: Option<ProfileArg>,

    /// Interval between elapsed-time updates, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL.as_millis() as u64)]
    progress_interval_ms: u64,

    /// Do not print elapsed-time updates.
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Gaussian,
    Binomial,
}

impl From<ProfileArg> for MaskProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Gaussian => MaskProfile::Gaussian,
            ProfileArg::Binomial => MaskProfile::Binomial,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;
    config.validate()?;

    let mut buffer = image_file::read_rgb(&cli.input)?;
    log::info!(
        "Loaded {} ({}x{})",
        cli.input.display(),
        buffer.width(),
        buffer.height()
    );

    let mut engine = BlurEngine::new()
        .with_logger(Box::new(StdoutRunLogger::new()))
        .with_progress_interval(Duration::from_millis(cli.progress_interval_ms));
    if !cli.quiet {
        engine = engine.with_elapsed_observer(Arc::new(|elapsed: Duration| {
            eprint!("\rComputing image... {:.3}s", elapsed.as_secs_f64());
        }));
    }

    let result = engine.run(&mut buffer, &config)?;
    if !cli.quiet {
        eprintln!();
    }

    image_file::write_rgb(&cli.output, &buffer)?;
    log::info!(
        "Output written to {} ({} iterations, {} workers, {:.1}ms)",
        cli.output.display(),
        result.iterations_completed,
        result.partition_count,
        result.elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

fn build_config(cli: &Cli) -> Result<BlurConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BlurConfig::default(),
    };
    if let Some(mask_size) = cli.mask_size {
        config.mask_size = mask_size;
    }
    if let Some(blur_level) = cli.blur_level {
        config.blur_level = blur_level;
    }
    if let Some(iterations) = cli.iterations {
        config.iteration_count = iterations;
    }
    if let Some(threads) = cli.threads {
        config.worker_count = threads;
    }
    if let Some(profile) = cli.profile {
        config.profile = profile.into();
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<BlurConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
    let config = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.input == cli.output {
        return Err("Output must differ from input".into());
    }
    if let Some(mask_size) = cli.mask_size {
        if mask_size == 0 || mask_size % 2 == 0 {
            return Err(format!("Mask size must be a positive odd integer, got {mask_size}").into());
        }
    }
    if cli.progress_interval_ms == 0 {
        return Err("Progress interval must be at least 1ms".into());
    }
    Ok(())
}
