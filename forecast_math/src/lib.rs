//! # Forecast Math
//!
//! Numeric building blocks for additive time-series models.
//! This crate provides the dense linear algebra and feature generators used
//! to fit a trend + seasonality + regressor decomposition by penalized least
//! squares, without pulling in a full linear algebra library.

use thiserror::Error;

pub mod fourier;
pub mod linalg;
pub mod regression;

pub use fourier::fourier_terms;
pub use linalg::{Cholesky, DesignMatrix};
pub use regression::{RidgeFit, RidgeRegression};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Matrix is not positive definite (pivot {pivot} = {value})")]
    NotPositiveDefinite { pivot: usize, value: f64 },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
