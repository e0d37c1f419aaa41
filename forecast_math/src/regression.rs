//! Penalized least squares (ridge) regression with per-column penalties
//!
//! Minimizes `‖y − Xβ‖² + Σ λ_j β_j²`. A zero penalty leaves a column
//! effectively unpenalized; every diagonal entry also receives a tiny jitter
//! so columns without support (all zeros) still yield a solvable system with
//! a zero coefficient.

use crate::linalg::{Cholesky, DesignMatrix};
use crate::{MathError, Result};

/// Diagonal jitter added to every column of the normal matrix
pub const DIAGONAL_JITTER: f64 = 1e-9;

/// Ridge regression configured with one penalty per design column
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeRegression {
    penalties: Vec<f64>,
}

/// Result of a ridge fit
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    /// Fitted coefficients, one per design column
    pub coefficients: Vec<f64>,
    /// In-sample residuals `y − Xβ`
    pub residuals: Vec<f64>,
    /// Cholesky factor of the penalized normal matrix `XᵀX + Λ`
    pub factor: Cholesky,
}

impl RidgeRegression {
    /// Create a ridge regression with the given column penalties
    pub fn new(penalties: Vec<f64>) -> Result<Self> {
        if penalties.is_empty() {
            return Err(MathError::InvalidInput(
                "At least one column penalty is required".to_string(),
            ));
        }
        if let Some(bad) = penalties.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(MathError::InvalidInput(format!(
                "Penalties must be finite and non-negative, got {}",
                bad
            )));
        }

        Ok(Self { penalties })
    }

    /// Fit coefficients to the target values
    pub fn fit(&self, design: &DesignMatrix, y: &[f64]) -> Result<RidgeFit> {
        let p = self.penalties.len();
        if design.cols() != p {
            return Err(MathError::DimensionMismatch {
                expected: p,
                got: design.cols(),
            });
        }
        if design.rows() == 0 {
            return Err(MathError::InsufficientData(
                "Ridge regression needs at least one observation".to_string(),
            ));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Target contains non-finite values".to_string(),
            ));
        }

        let (mut xtx, xty) = design.normal_equations(y)?;
        for (j, penalty) in self.penalties.iter().enumerate() {
            xtx[j * p + j] += penalty + DIAGONAL_JITTER;
        }

        let factor = Cholesky::factor(&xtx, p)?;
        let coefficients = factor.solve(&xty)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(MathError::CalculationError(
                "Ridge solution contains non-finite coefficients".to_string(),
            ));
        }

        let residuals = design
            .iter_rows()
            .zip(y)
            .map(|(row, &target)| target - dot(row, &coefficients))
            .collect();

        Ok(RidgeFit {
            coefficients,
            residuals,
            factor,
        })
    }
}

impl RidgeFit {
    /// Root mean squared residual
    pub fn residual_scale(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        let rss: f64 = self.residuals.iter().map(|r| r * r).sum();
        (rss / self.residuals.len() as f64).sqrt()
    }
}

/// Dot product of two equally sized slices
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
