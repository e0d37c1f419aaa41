//! Error types for the demand_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Training input has no observations
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The underlying fit procedure failed; no model was produced
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Forecast horizon outside the supported range
    #[error("Invalid horizon: {requested} days (must be between {min} and {max})")]
    InvalidHorizon { requested: i64, min: i64, max: i64 },

    /// Forecast requested from a service without a loaded model
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error while reading configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Error while saving or loading a model
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl ForecastError {
    /// Stable snake_case code used in structured error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::InsufficientData(_) => "insufficient_data",
            ForecastError::ModelFit(_) => "model_fit",
            ForecastError::InvalidHorizon { .. } => "invalid_horizon",
            ForecastError::ModelNotLoaded(_) => "model_not_loaded",
            ForecastError::DataError(_) => "data_error",
            ForecastError::InvalidParameter(_) => "invalid_parameter",
            ForecastError::Config(_) => "config_error",
            ForecastError::Persistence(_) => "persistence_error",
            ForecastError::IoError(_) => "io_error",
            ForecastError::CsvError(_) => "csv_error",
            ForecastError::Math(_) => "math_error",
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Persistence(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}
