//! Typhoon dataset sampler.
//!
//! Opens one side of the event split, prints the sample index layout and
//! writes JSON summaries of the requested samples to stdout.

mod report;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ty_dataset::{DatasetConfig, SplitMode, SplitRequest, TyDataset};

use report::{render_index_table, SampleReport};

#[derive(Parser, Debug)]
#[command(name = "ty-sampler")]
#[command(about = "Inspect typhoon dataset splits, indices and samples")]
struct Args {
    /// Dataset configuration file (YAML). Defaults plus TY_* variables when omitted.
    #[arg(short, long, env = "TY_CONFIG")]
    config: Option<PathBuf>,

    /// Split to open: train or test
    #[arg(short, long, default_value = "train", env = "TY_SPLIT")]
    split: String,

    /// Size of the training prefix (default: three quarters of the events)
    #[arg(long, env = "TY_TRAIN_COUNT")]
    train_count: Option<usize>,

    /// Sample indices to summarize; negative values are rejected by the dataset
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    indices: Vec<i64>,

    /// Summarize every sample in the split
    #[arg(long, conflicts_with = "indices")]
    all: bool,

    /// Maximum samples assembled concurrently
    #[arg(long, default_value = "4", env = "TY_CONCURRENCY")]
    concurrency: usize,

    /// Skip the index table
    #[arg(long)]
    quiet: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = match &args.config {
        Some(path) => DatasetConfig::from_yaml(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DatasetConfig::from_env().context("reading TY_* environment")?,
    };

    let Some(mode) = SplitMode::from_str(&args.split) else {
        bail!("unknown split {:?}, expected train or test", args.split);
    };
    let request = SplitRequest {
        mode,
        train_count: args.train_count,
    };

    info!(
        split = %mode,
        event_list = %config.source.event_list.display(),
        "Opening dataset"
    );
    let dataset = TyDataset::open(&config, &request)?;

    if !args.quiet {
        print!("{}", render_index_table(mode, dataset.index()));
    }

    let indices: Vec<i64> = if args.all {
        (0..dataset.len() as i64).collect()
    } else {
        args.indices.clone()
    };

    // Resolve everything first so a bad index fails before any reads
    let mut resolved = Vec::with_capacity(indices.len());
    for &idx in &indices {
        let location = dataset.locate(idx)?;
        resolved.push((idx as usize, location.event.name.clone(), location.local_offset));
    }

    let positions: Vec<usize> = resolved.iter().map(|(idx, _, _)| *idx).collect();
    let samples = dataset.get_many(&positions, args.concurrency).await?;

    for ((index, event, local_offset), sample) in resolved.iter().zip(&samples) {
        let report = SampleReport {
            index: *index,
            event,
            local_offset: *local_offset,
            summary: sample.summary(),
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    info!(samples = samples.len(), "Done");
    Ok(())
}
