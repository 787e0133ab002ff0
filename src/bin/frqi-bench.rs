//! Batch benchmark for FRQI encode/decode fidelity.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --bin frqi-bench -- --dataset digits.json --size 50 --metric ssim
//! ```
//!
//! The dataset is a JSON array of 64-value arrays (flattened 8x8 images with
//! intensities 0-255). The `BatchReport` is printed to stdout as JSON.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use frqi::{BatchConfig, BatchJob, BatchScheduler, Dataset, InMemoryDataset, MetricKind};

#[derive(Parser)]
#[command(name = "frqi-bench")]
#[command(about = "Measure FRQI reconstruction fidelity across shot counts")]
#[command(version)]
struct Cli {
    /// JSON file holding an array of 64-value image arrays
    #[arg(long)]
    dataset: PathBuf,

    /// JSON batch config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// First dataset index of the batch
    #[arg(long, default_value = "0")]
    start: usize,

    /// Number of consecutive images to evaluate
    #[arg(long, default_value = "10")]
    size: usize,

    /// Evaluate this many distinct random images instead of a range
    #[arg(long, conflicts_with = "start")]
    sample: Option<usize>,

    /// Fidelity metric
    #[arg(long, value_parser = ["fidelity", "ssim", "mae", "weighted-mae"])]
    metric: Option<String>,

    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Shot counts, comma separated (default 100,200,...,2000)
    #[arg(long, value_delimiter = ',')]
    shots: Option<Vec<u64>>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(path: Option<&Path>) -> Result<BatchConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(BatchConfig::from_json_str(&fs::read_to_string(path)?)?),
        None => Ok(BatchConfig::default()),
    }
}

fn load_dataset(path: &Path) -> Result<InMemoryDataset, Box<dyn Error>> {
    let rows: Vec<Vec<i64>> = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(InMemoryDataset::from_rows(&rows)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(shots) = cli.shots {
        config.shot_counts = Some(shots);
    }
    if let Some(metric) = cli.metric.as_deref() {
        config.metric = Some(metric.parse::<MetricKind>()?);
    }
    if cli.seed.is_some() {
        config.simulator.seed = cli.seed;
    }

    let dataset = Arc::new(load_dataset(&cli.dataset)?);
    log::info!("Loaded {} images from {}", dataset.len(), cli.dataset.display());

    let metric = config.metric_or_default();
    let shot_counts = config.shot_counts_or_default();
    let job = match cli.sample {
        Some(count) => BatchJob::sample(dataset.len(), count, metric, shot_counts, config.simulator.seed)?,
        None => BatchJob::range(cli.start, cli.size, metric, shot_counts),
    };

    let scheduler = BatchScheduler::with_simulator_config(dataset, &config);
    let report = scheduler.run_batch(job)?;

    for average in &report.averages {
        log::info!("{:>6} shots: average {} = {:.6}", average.shots, metric, average.average);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
