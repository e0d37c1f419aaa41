//! Request-path forecasting over a loaded demand model

use crate::error::{ForecastError, Result};
use crate::models::{DemandModel, TrainedForecastModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Shortest forecast horizon, in days
pub const MIN_HORIZON_DAYS: i64 = 1;
/// Longest forecast horizon, in days
pub const MAX_HORIZON_DAYS: i64 = 365;

/// A validated forecast horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Horizon(usize);

impl Horizon {
    /// Validate a requested number of days. Out of range values are rejected, never clamped.
    pub fn new(days: i64) -> Result<Self> {
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&days) {
            return Err(ForecastError::InvalidHorizon {
                requested: days,
                min: MIN_HORIZON_DAYS,
                max: MAX_HORIZON_DAYS,
            });
        }
        Ok(Self(days as usize))
    }

    pub fn days(&self) -> usize {
        self.0
    }
}

impl TryFrom<i64> for Horizon {
    type Error = ForecastError;

    fn try_from(days: i64) -> Result<Self> {
        Self::new(days)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}

/// One forecasted day, in whole bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    pub yhat: u32,
    pub yhat_lower: u32,
    pub yhat_upper: u32,
}

impl ForecastPoint {
    /// Round and bound raw model output.
    ///
    /// Each value is rounded to the nearest integer and floored at zero, then
    /// the bounds are widened if needed so that `yhat_lower <= yhat <= yhat_upper`.
    pub fn from_raw(date: NaiveDate, yhat: f64, lower: f64, upper: f64) -> Self {
        let yhat = to_count(yhat);
        Self {
            date,
            yhat,
            yhat_lower: to_count(lower).min(yhat),
            yhat_upper: to_count(upper).max(yhat),
        }
    }
}

// Float to integer casts saturate and map NaN to 0
fn to_count(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Forecast `horizon_days` days past the end of the model's history
pub fn predict(model: &DemandModel, horizon_days: i64) -> Result<Vec<ForecastPoint>> {
    let horizon = Horizon::new(horizon_days)?;
    let result = model.forecast(horizon.days())?;

    let dates = result.dates().ok_or_else(|| {
        ForecastError::DataError("forecast result carries no dates".to_string())
    })?;
    let intervals = result.intervals().ok_or_else(|| {
        ForecastError::DataError("forecast result carries no intervals".to_string())
    })?;

    let points = dates
        .iter()
        .zip(result.values())
        .zip(intervals)
        .map(|((&date, &yhat), &(lower, upper))| ForecastPoint::from_raw(date, yhat, lower, upper))
        .collect();

    debug!(horizon = %horizon, "forecast produced");
    Ok(points)
}

/// Read-only forecasting service shared across request handlers.
///
/// A service built without a model answers every call with
/// [`ForecastError::ModelNotLoaded`].
#[derive(Debug, Clone)]
pub struct ForecastService {
    model: Option<Arc<DemandModel>>,
    unavailable_reason: String,
}

impl ForecastService {
    pub fn new(model: Arc<DemandModel>) -> Self {
        Self {
            model: Some(model),
            unavailable_reason: String::new(),
        }
    }

    /// A service whose model failed to load
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            model: None,
            unavailable_reason: reason.into(),
        }
    }

    /// Wrap the outcome of a startup model load
    pub fn from_load_result(result: Result<DemandModel>) -> Self {
        match result {
            Ok(model) => Self::new(Arc::new(model)),
            Err(err) => {
                error!(error = %err, "demand model failed to load; forecasts are unavailable");
                Self::unavailable(err.to_string())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&Arc<DemandModel>> {
        self.model.as_ref()
    }

    /// Forecast the next `horizon_days` days
    pub fn predict(&self, horizon_days: i64) -> Result<Vec<ForecastPoint>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ForecastError::ModelNotLoaded(self.unavailable_reason.clone()))?;
        predict(model, horizon_days)
    }
}
