//! Offline training of the demand model

use crate::calendar::{HolidayCalendar, HolidayEvent};
use crate::config::{FitSettings, SeasonalityConfig, TrainingConfig};
use crate::data::{DailySeries, Observation};
use crate::error::{ForecastError, Result};
use crate::metrics::forecast_accuracy;
use crate::models::features::FeatureLayout;
use crate::models::{DemandModel, ForecastModel, TrainingWarning};
use crate::service::MAX_HORIZON_DAYS;
use chrono::Duration;
use forecast_math::RidgeRegression;
use tracing::{info, warn};

/// Fits a [`DemandModel`] from historical observations and a holiday list
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    name: String,
    seasonality: SeasonalityConfig,
    settings: FitSettings,
    holidays: Vec<HolidayEvent>,
    calendar_years: Option<(i32, i32)>,
}

impl ModelTrainer {
    /// Create a trainer with default fit settings and no holidays
    pub fn new(seasonality: SeasonalityConfig) -> Self {
        Self {
            name: "Additive demand model".to_string(),
            seasonality,
            settings: FitSettings::default(),
            holidays: Vec::new(),
            calendar_years: None,
        }
    }

    /// Create a trainer from a full training configuration, building its calendar
    pub fn from_config(config: &TrainingConfig) -> Result<Self> {
        config.validate()?;
        let calendar = config.calendar.build()?;
        Ok(Self::new(config.seasonality.clone())
            .with_settings(config.fit.clone())
            .with_calendar(&calendar))
    }

    /// Override trend, prior and interval settings
    pub fn with_settings(mut self, settings: FitSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use a plain list of holiday events
    pub fn with_holidays(mut self, holidays: Vec<HolidayEvent>) -> Self {
        self.holidays = holidays;
        self.calendar_years = None;
        self
    }

    /// Use a precomputed calendar; its year span is checked against the history
    pub fn with_calendar(mut self, calendar: &HolidayCalendar) -> Self {
        self.holidays = calendar.events().to_vec();
        self.calendar_years = Some((calendar.first_year(), calendar.last_year()));
        self
    }

    /// Holidays the trainer will fit regressors for
    pub fn holidays(&self) -> &[HolidayEvent] {
        &self.holidays
    }

    /// Fit the model to the observations.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InsufficientData`] if `observations` is empty
    /// * [`ForecastError::InvalidParameter`] for an invalid configuration
    /// * [`ForecastError::DataError`] if a date appears twice
    /// * [`ForecastError::ModelFit`] if the regression cannot be solved
    pub fn fit(&self, observations: &[Observation]) -> Result<DemandModel> {
        if observations.is_empty() {
            return Err(ForecastError::InsufficientData(
                "cannot fit a demand model on zero observations".to_string(),
            ));
        }
        let series = DailySeries::new(observations)?;
        self.fit_series(&series)
    }

    fn fit_series(&self, series: &DailySeries) -> Result<DemandModel> {
        self.seasonality.validate()?;
        self.settings.validate()?;

        let dates = series.dates();
        let counts = series.values();
        info!(
            observations = series.len(),
            start = %series.first_date(),
            end = %series.last_date(),
            holidays = self.holidays.len(),
            "fitting demand model"
        );

        let warnings = self.collect_warnings(series);
        for warning in &warnings {
            warn!("{}", warning);
        }

        let y_scale = counts.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let scaled: Vec<f64> = counts.iter().map(|v| v / y_scale).collect();

        let layout = FeatureLayout::new(&dates, &self.holidays, &self.seasonality, &self.settings)
            .map_err(fit_failure)?;
        let design = layout.design(&dates).map_err(fit_failure)?;
        let ridge = RidgeRegression::new(layout.penalties(&self.settings)).map_err(fit_failure)?;
        let fit = ridge.fit(&design, &scaled).map_err(fit_failure)?;

        let sigma = fit.residual_scale();
        if !sigma.is_finite() {
            return Err(ForecastError::ModelFit("residual noise is not finite".to_string()));
        }

        let deltas = &fit.coefficients[layout.changepoint_range()];
        let trend_change_scale = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64
        };
        let trend_change_rate = deltas.len() as f64;

        let fitted: Vec<f64> = scaled
            .iter()
            .zip(&fit.residuals)
            .map(|(y, r)| (y - r) * y_scale)
            .collect();
        let metrics = forecast_accuracy(&fitted, &counts)?;

        let model = DemandModel {
            name: self.name.clone(),
            layout,
            coefficients: fit.coefficients,
            y_scale,
            sigma,
            precision: fit.factor,
            trend_change_rate,
            trend_change_scale,
            interval_width: self.settings.interval_width,
            history: dates,
            metrics,
            warnings,
        };

        info!(
            metrics = %model.metrics(),
            low_confidence = model.is_low_confidence(),
            "demand model fitted"
        );
        Ok(model)
    }

    fn collect_warnings(&self, series: &DailySeries) -> Vec<TrainingWarning> {
        let mut warnings = Vec::new();

        if series.len() < self.settings.min_reliable_observations {
            warnings.push(TrainingWarning::LowObservationCount {
                observed: series.len(),
                recommended: self.settings.min_reliable_observations,
            });
        }

        if let Some((first_year, last_year)) = self.calendar_years {
            let required_until = series.last_date() + Duration::days(MAX_HORIZON_DAYS);
            let calendar = HolidayCalendar::empty(first_year, last_year);
            let covered = calendar
                .as_ref()
                .map(|c| c.covers(series.first_date(), required_until))
                .unwrap_or(false);
            if !covered {
                warnings.push(TrainingWarning::CalendarCoverage {
                    required_until,
                    covered_until: calendar.ok().and_then(|c| c.last_covered_date()),
                });
            }
        }

        warnings
    }
}

// Numeric failures while building or solving the system mean no model was fitted
fn fit_failure(err: impl Into<ForecastError>) -> ForecastError {
    match err.into() {
        ForecastError::Math(err) => ForecastError::ModelFit(err.to_string()),
        other => other,
    }
}

impl ForecastModel for ModelTrainer {
    type Trained = DemandModel;

    fn train(&self, data: &DailySeries) -> Result<DemandModel> {
        self.fit_series(data)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fit a demand model with default fit settings.
///
/// Fewer than 50 observations still produce a model, flagged through
/// [`DemandModel::warnings`] and [`DemandModel::is_low_confidence`].
pub fn fit(
    observations: &[Observation],
    holidays: &[HolidayEvent],
    config: &SeasonalityConfig,
) -> Result<DemandModel> {
    ModelTrainer::new(config.clone())
        .with_holidays(holidays.to_vec())
        .fit(observations)
}
