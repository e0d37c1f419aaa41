//! Forecast query process
//!
//! Loads the demand model once at startup and answers forecast queries with
//! JSON, one line per query. Queries come from the command line or, when none
//! are given, from stdin.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin forecast_api -- "forecast?horizon_days=14"
//! echo "forecast?horizon_days=7" | cargo run --bin forecast_api
//! ```
//!
//! # Environment Variables
//!
//! - `DEMAND_MODEL_PATH`: Model file (default: demand_model.json)
//! - `DEFAULT_HORIZON_DAYS`: Horizon when a query omits it (default: 30)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::io::{self, BufRead, Write};

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use demand_forecast::config::ServiceConfig;
use demand_forecast::persistence;
use demand_forecast::query::handle_forecast_query;
use demand_forecast::service::ForecastService;

fn answer(
    service: &ForecastService,
    query: &str,
    default_horizon: i64,
    out: &mut impl Write,
) -> io::Result<()> {
    let response = handle_forecast_query(service, query, default_horizon);
    if response.is_error() {
        warn!(query, "forecast query failed");
    }
    writeln!(out, "{}", response.to_body())
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only responses
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let config = ServiceConfig::from_env()?;
    info!(model_path = %config.model_path.display(), "Starting forecast API");

    let service = ForecastService::from_load_result(persistence::load(&config.model_path));
    if service.is_ready() {
        info!("Model ready");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let queries: Vec<String> = env::args().skip(1).collect();
    if !queries.is_empty() {
        for query in &queries {
            answer(&service, query, config.default_horizon_days, &mut out)?;
        }
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        answer(&service, &line, config.default_horizon_days, &mut out)?;
    }
    Ok(())
}
