//! Offline training job
//!
//! Reads daily completed-booking counts, fits the demand model and writes it
//! to disk for the forecast service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin train_model -- bookings.csv --config training.toml --output demand_model.json
//! ```
//!
//! # Environment Variables
//!
//! - `DEMAND_MODEL_PATH`: Output path when `--output` is not given (default: demand_model.json)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use demand_forecast::config::{ServiceConfig, TrainingConfig};
use demand_forecast::data::DataLoader;
use demand_forecast::models::ModelTrainer;
use demand_forecast::persistence;

#[derive(Debug, Parser)]
#[command(
    name = "train_model",
    about = "Fit the rental demand model from daily booking counts",
    version
)]
struct Args {
    /// CSV file with `ds,y` (or `date,count`) columns
    observations: PathBuf,
    /// TOML training configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where to write the model; defaults to `DEMAND_MODEL_PATH`
    #[arg(long)]
    output: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)
            .with_context(|| format!("reading training config {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    let output = match args.output {
        Some(path) => path,
        None => ServiceConfig::from_env()?.model_path,
    };

    let observations = DataLoader::from_csv(&args.observations)
        .with_context(|| format!("reading observations {}", args.observations.display()))?;
    info!(rows = observations.len(), "observations loaded");

    let trainer = ModelTrainer::from_config(&config)?;
    let model = trainer.fit(&observations)?;
    info!(
        history_start = %model.history_start(),
        history_end = %model.history_end(),
        metrics = %model.metrics(),
        "training complete"
    );

    persistence::save(&model, &output)
        .with_context(|| format!("writing model {}", output.display()))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    info!("Starting demand model training");

    if let Err(err) = run(args) {
        error!("training failed: {:#}", err);
        return Err(err);
    }
    Ok(())
}
