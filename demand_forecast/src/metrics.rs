//! Accuracy metrics for fitted values

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// In-sample accuracy of a fitted model, in booking counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over days with non-zero demand
    pub mape: Option<f64>,
}

/// Calculate accuracy metrics for fitted vs actual values
pub fn forecast_accuracy(fitted: &[f64], actual: &[f64]) -> Result<FitMetrics> {
    if fitted.len() != actual.len() || fitted.is_empty() {
        return Err(ForecastError::DataError(
            "Fitted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = fitted.len() as f64;
    let errors: Vec<f64> = fitted.iter().zip(actual).map(|(&f, &a)| a - f).collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e.powi(2)).sum::<f64>() / n).sqrt();

    // Days without bookings have no defined percentage error
    let percentage_errors: Vec<f64> = actual
        .iter()
        .zip(&errors)
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| e.abs() / a.abs() * 100.0)
        .collect();
    let mape = if percentage_errors.is_empty() {
        None
    } else {
        Some(percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64)
    };

    Ok(FitMetrics { mae, rmse, mape })
}

impl fmt::Display for FitMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MAE {:.3}, RMSE {:.3}", self.mae, self.rmse)?;
        if let Some(mape) = self.mape {
            write!(f, ", MAPE {:.2}%", mape)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_accuracy() {
        let metrics = forecast_accuracy(&[9.0, 11.0, 0.0], &[10.0, 10.0, 0.0]).unwrap();
        assert_abs_diff_eq!(metrics.mae, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.rmse, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.mape.unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_all_zero_actuals_have_no_mape() {
        let metrics = forecast_accuracy(&[1.0], &[0.0]).unwrap();
        assert_eq!(metrics.mape, None);
        assert!(forecast_accuracy(&[], &[]).is_err());
    }
}
