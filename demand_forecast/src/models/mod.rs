//! Demand model: fitted additive decomposition and its forecast interface

use crate::calendar::HolidayEvent;
use crate::data::DailySeries;
use crate::error::{ForecastError, Result};
use crate::metrics::FitMetrics;
use chrono::{Duration, NaiveDate};
use forecast_math::regression::dot;
use forecast_math::Cholesky;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::{self, Debug};

pub mod features;
pub mod trainer;

pub use features::FeatureLayout;
pub use trainer::{fit, ModelTrainer};

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    pub(crate) values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Lower and upper interval bounds (optional)
    pub(crate) intervals: Option<Vec<(f64, f64)>>,
    /// Dates of the forecasted values (optional)
    pub(crate) dates: Option<Vec<NaiveDate>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::DataError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
            dates: None,
        })
    }

    /// Create a new forecast result with interval bounds
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        let mut result = Self::new(values, horizons)?;
        if intervals.len() != horizons {
            return Err(ForecastError::DataError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                horizons,
                intervals.len()
            )));
        }
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Attach the dates the values belong to
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.horizons {
            return Err(ForecastError::DataError(format!(
                "Values length ({}) doesn't match dates length ({})",
                self.horizons,
                dates.len()
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the interval bounds, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Get the dates, if available
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for the periods following the history
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// Predict values for the given observed dates
    fn predict(&self, data: &DailySeries) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a daily series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a daily series
    fn train(&self, data: &DailySeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Non-fatal condition detected while training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainingWarning {
    /// Fewer observations than roughly two seasonal cycles
    LowObservationCount { observed: usize, recommended: usize },
    /// Holiday calendar ends before the furthest forecastable date
    CalendarCoverage {
        required_until: NaiveDate,
        covered_until: Option<NaiveDate>,
    },
}

impl fmt::Display for TrainingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingWarning::LowObservationCount {
                observed,
                recommended,
            } => write!(
                f,
                "only {} observations (at least {} recommended); forecasts will be unreliable",
                observed, recommended
            ),
            TrainingWarning::CalendarCoverage {
                required_until,
                covered_until,
            } => match covered_until {
                Some(end) => write!(
                    f,
                    "holiday calendar ends {} but forecasts may reach {}; later dates get no holiday adjustment",
                    end, required_until
                ),
                None => write!(f, "holiday calendar does not reach {}", required_until),
            },
        }
    }
}

/// Per-date contributions of each model component, in booking counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRow {
    pub date: NaiveDate,
    pub trend: f64,
    pub weekly: f64,
    pub yearly: f64,
    pub holidays: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Fitted additive demand model.
///
/// `yhat(d) = trend(d) + weekly(d) + yearly(d) + holidays(d)`, evaluated on
/// max-abs-scaled counts and rescaled on output. Immutable once trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandModel {
    pub(crate) name: String,
    pub(crate) layout: FeatureLayout,
    pub(crate) coefficients: Vec<f64>,
    /// Divisor applied to counts before fitting
    pub(crate) y_scale: f64,
    /// Residual noise in scaled units
    pub(crate) sigma: f64,
    /// Factor of the penalized normal matrix, for parameter uncertainty
    pub(crate) precision: Cholesky,
    /// Expected trend changes per unit of scaled time
    pub(crate) trend_change_rate: f64,
    /// Laplace scale of trend rate changes
    pub(crate) trend_change_scale: f64,
    pub(crate) interval_width: f64,
    pub(crate) history: Vec<NaiveDate>,
    pub(crate) metrics: FitMetrics,
    pub(crate) warnings: Vec<TrainingWarning>,
}

impl DemandModel {
    /// First historical date
    pub fn history_start(&self) -> NaiveDate {
        self.history[0]
    }

    /// Last historical date; forecasts start the day after
    pub fn history_end(&self) -> NaiveDate {
        self.history[self.history.len() - 1]
    }

    /// Historical dates the model was fitted on
    pub fn history(&self) -> &[NaiveDate] {
        &self.history
    }

    /// Holiday events baked into the model
    pub fn holidays(&self) -> &[HolidayEvent] {
        self.layout.holidays()
    }

    /// In-sample fit quality
    pub fn metrics(&self) -> &FitMetrics {
        &self.metrics
    }

    /// Warnings raised while training
    pub fn warnings(&self) -> &[TrainingWarning] {
        &self.warnings
    }

    /// Whether the model was trained on too little data to be trusted
    pub fn is_low_confidence(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, TrainingWarning::LowObservationCount { .. }))
    }

    /// Coverage of the uncertainty interval
    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    /// Feature layout of the fitted decomposition
    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Historical dates followed by `horizon` consecutive future dates
    pub fn make_future_frame(&self, horizon: usize) -> Vec<NaiveDate> {
        let last = self.history_end();
        let mut frame = self.history.clone();
        frame.extend((1..=horizon as i64).map(|i| last + Duration::days(i)));
        frame
    }

    /// Evaluate every component and the uncertainty interval on `dates`
    pub fn components(&self, dates: &[NaiveDate]) -> Result<Vec<ComponentRow>> {
        let design = self.layout.design(dates)?;
        let z = interval_multiplier(self.interval_width)?;
        let trend_range = self.layout.trend_range();
        let holiday_range = self.layout.holiday_range();
        let seasonal_ranges = self.layout.seasonal_ranges();

        let mut rows = Vec::with_capacity(dates.len());
        for (row, &date) in design.iter_rows().zip(dates) {
            let part = |range: std::ops::Range<usize>| {
                dot(&row[range.clone()], &self.coefficients[range]) * self.y_scale
            };

            let mut weekly = 0.0;
            let mut yearly = 0.0;
            for (term, range) in &seasonal_ranges {
                match term.name.as_str() {
                    "weekly" => weekly += part(range.clone()),
                    "yearly" => yearly += part(range.clone()),
                    _ => {}
                }
            }
            let trend = part(trend_range.clone());
            let holidays = part(holiday_range.clone());
            let yhat = dot(row, &self.coefficients) * self.y_scale;

            let variance = self.sigma.powi(2) * (1.0 + self.precision.inverse_quadratic_form(row)?)
                + self.trend_variance(self.layout.scaled_time(date));
            let half_width = z * variance.sqrt() * self.y_scale;

            rows.push(ComponentRow {
                date,
                trend,
                weekly,
                yearly,
                holidays,
                yhat,
                yhat_lower: yhat - half_width,
                yhat_upper: yhat + half_width,
            });
        }

        Ok(rows)
    }

    /// Holiday contribution on a single date
    pub fn holiday_component(&self, date: NaiveDate) -> Result<f64> {
        let rows = self.components(&[date])?;
        Ok(rows[0].holidays)
    }

    /// Variance of future trend rate changes at scaled time `t`.
    ///
    /// Changes arrive at `trend_change_rate` per unit time beyond the history
    /// with Laplace(0, b) magnitudes, so the accumulated variance is
    /// `rate · 2b² · (t − 1)³ / 3`.
    fn trend_variance(&self, t: f64) -> f64 {
        if t <= 1.0 {
            return 0.0;
        }
        let b = self.trend_change_scale;
        self.trend_change_rate * 2.0 * b * b * (t - 1.0).powi(3) / 3.0
    }

    fn rows_to_result(rows: &[ComponentRow]) -> Result<ForecastResult> {
        let values = rows.iter().map(|r| r.yhat).collect();
        let intervals = rows.iter().map(|r| (r.yhat_lower, r.yhat_upper)).collect();
        let dates = rows.iter().map(|r| r.date).collect();
        ForecastResult::new_with_intervals(values, rows.len(), intervals)?.with_dates(dates)
    }

    /// Check internal consistency after deserialization
    pub(crate) fn validate(&self) -> Result<()> {
        let columns = self.layout.n_columns();
        if self.history.is_empty() {
            return Err(ForecastError::Persistence("model has no history".to_string()));
        }
        if self.coefficients.len() != columns || self.precision.dim() != columns {
            return Err(ForecastError::Persistence(format!(
                "model expects {} columns but stores {} coefficients and a {}-dimensional precision factor",
                columns,
                self.coefficients.len(),
                self.precision.dim()
            )));
        }
        if self.y_scale <= 0.0
            || !self.y_scale.is_finite()
            || !self.sigma.is_finite()
            || self.sigma < 0.0
        {
            return Err(ForecastError::Persistence(
                "model scale parameters are invalid".to_string(),
            ));
        }
        Ok(())
    }
}

impl TrainedForecastModel for DemandModel {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least one day".to_string(),
            ));
        }

        let frame = self.make_future_frame(horizon);
        let mut rows = self.components(&frame)?;
        let future = rows.split_off(rows.len() - horizon);

        Self::rows_to_result(&future)
    }

    fn predict(&self, data: &DailySeries) -> Result<ForecastResult> {
        let rows = self.components(&data.dates())?;
        Self::rows_to_result(&rows)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Two-sided standard normal multiplier for an interval of the given coverage
pub fn interval_multiplier(interval_width: f64) -> Result<f64> {
    if !(interval_width > 0.0 && interval_width < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "interval width must be between 0 and 1, got {}",
            interval_width
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::ModelFit(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + interval_width / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_interval_multiplier() {
        assert_abs_diff_eq!(interval_multiplier(0.8).unwrap(), 1.2816, epsilon = 1e-3);
        assert_abs_diff_eq!(interval_multiplier(0.95).unwrap(), 1.96, epsilon = 1e-3);
        assert!(interval_multiplier(0.0).is_err());
        assert!(interval_multiplier(1.0).is_err());
    }

    #[test]
    fn test_forecast_result_lengths() {
        assert!(ForecastResult::new(vec![1.0, 2.0], 3).is_err());
        let result = ForecastResult::new_with_intervals(vec![1.0], 1, vec![(0.5, 1.5)]).unwrap();
        assert_eq!(result.intervals(), Some(&[(0.5, 1.5)][..]));
        assert!(result.clone().with_dates(vec![]).is_err());
        assert!(result.dates().is_none());
    }

    #[test]
    fn test_warning_display() {
        let warning = TrainingWarning::LowObservationCount {
            observed: 5,
            recommended: 50,
        };
        assert!(warning.to_string().contains("only 5 observations"));
    }
}
