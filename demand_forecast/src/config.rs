//! Training and serving configuration
//!
//! Training settings come from an optional TOML file; every field has a
//! default so an empty file (or no file) reproduces the built-in setup.
//! Serving settings come from environment variables.

use crate::calendar::{
    FixedHoliday, HolidayCalendar, LunarHoliday, DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR,
    VIETNAM_FIXED_HOLIDAYS,
};
use crate::error::{ForecastError, Result};
use crate::service::{MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the persisted model
pub const DEFAULT_MODEL_PATH: &str = "demand_model.json";
/// Horizon used when a query does not specify one
pub const DEFAULT_HORIZON_DAYS: i64 = 30;
/// Below this many observations a fitted model is flagged as low confidence
pub const MIN_RELIABLE_OBSERVATIONS: usize = 50;

/// Environment variable holding the model path
pub const MODEL_PATH_ENV: &str = "DEMAND_MODEL_PATH";
/// Environment variable holding the default horizon
pub const DEFAULT_HORIZON_ENV: &str = "DEFAULT_HORIZON_DAYS";

/// Periodic components to include in the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalityConfig {
    /// Intra-day cycle; unsupported for one observation per day
    pub daily: bool,
    /// Day-of-week cycle
    pub weekly: bool,
    /// Seasonal cycle over the year
    pub yearly: bool,
    /// Fourier order of the weekly component
    pub weekly_order: usize,
    /// Fourier order of the yearly component
    pub yearly_order: usize,
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        Self {
            daily: false,
            weekly: true,
            yearly: true,
            weekly_order: 3,
            yearly_order: 10,
        }
    }
}

impl SeasonalityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.daily {
            return Err(ForecastError::InvalidParameter(
                "daily seasonality needs intra-day observations; the series has one point per day"
                    .to_string(),
            ));
        }
        if self.weekly && self.weekly_order == 0 {
            return Err(ForecastError::InvalidParameter(
                "weekly_order must be at least 1".to_string(),
            ));
        }
        if self.yearly && self.yearly_order == 0 {
            return Err(ForecastError::InvalidParameter(
                "yearly_order must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trend, regularization and interval settings for the fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Maximum number of potential trend changepoints
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Prior scale of trend rate changes; smaller is stiffer
    pub changepoint_prior_scale: f64,
    /// Prior scale of Fourier coefficients
    pub seasonality_prior_scale: f64,
    /// Prior scale of holiday effects
    pub holidays_prior_scale: f64,
    /// Coverage of the uncertainty interval
    pub interval_width: f64,
    /// Observation count below which the model is flagged as low confidence
    pub min_reliable_observations: usize,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            holidays_prior_scale: 10.0,
            interval_width: 0.8,
            min_reliable_observations: MIN_RELIABLE_OBSERVATIONS,
        }
    }
}

impl FitSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        for (name, scale) in [
            ("changepoint_prior_scale", self.changepoint_prior_scale),
            ("seasonality_prior_scale", self.seasonality_prior_scale),
            ("holidays_prior_scale", self.holidays_prior_scale),
        ] {
            if !(scale > 0.0 && scale.is_finite()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, scale
                )));
            }
            // The ridge penalty is 1 / scale²
            if !(1.0 / (scale * scale)).is_finite() {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} is too small, got {}",
                    name, scale
                )));
            }
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be between 0 and 1, got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// Holiday calendar definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub first_year: i32,
    pub last_year: i32,
    pub fixed: Vec<FixedHoliday>,
    pub lunar: Vec<LunarHoliday>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            first_year: DEFAULT_FIRST_YEAR,
            last_year: DEFAULT_LAST_YEAR,
            fixed: VIETNAM_FIXED_HOLIDAYS
                .iter()
                .map(|&(name, month, day)| FixedHoliday::new(name, month, day))
                .collect(),
            lunar: vec![LunarHoliday::tet()],
        }
    }
}

impl CalendarConfig {
    /// Build the holiday calendar described by this configuration
    pub fn build(&self) -> Result<HolidayCalendar> {
        let mut builder = HolidayCalendar::builder().years(self.first_year, self.last_year);
        for holiday in &self.fixed {
            builder = builder.fixed(holiday.clone());
        }
        for holiday in &self.lunar {
            builder = builder.lunar(holiday.clone());
        }
        builder.build()
    }
}

/// Everything the offline training job needs besides the observations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub seasonality: SeasonalityConfig,
    pub fit: FitSettings,
    pub calendar: CalendarConfig,
}

impl TrainingConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: TrainingConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.seasonality.validate()?;
        self.fit.validate()
    }
}

/// Settings of the forecast serving process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Path of the model file loaded at startup
    pub model_path: PathBuf,
    /// Horizon used when a query omits it
    pub default_horizon_days: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            default_horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl ServiceConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(MODEL_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.model_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(DEFAULT_HORIZON_ENV) {
            let horizon: i64 = raw.trim().parse().map_err(|_| {
                ForecastError::Config(format!(
                    "{} must be an integer, got '{}'",
                    DEFAULT_HORIZON_ENV, raw
                ))
            })?;
            if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon) {
                return Err(ForecastError::Config(format!(
                    "{} must be between {} and {}, got {}",
                    DEFAULT_HORIZON_ENV, MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, horizon
                )));
            }
            config.default_horizon_days = horizon;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = TrainingConfig::from_toml_str("").unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert!(!config.seasonality.daily);
        assert!(config.seasonality.weekly);
        assert!(config.seasonality.yearly);
        assert_eq!(config.fit.min_reliable_observations, 50);
    }

    #[test]
    fn test_toml_overrides() {
        let source = r#"
            [fit]
            interval_width = 0.95

            [calendar]
            first_year = 2024
            last_year = 2024
            fixed = [{ name = "Founders Day", month = 3, day = 14 }]

            [[calendar.lunar]]
            name = "Festival"
            dates = ["2024-06-10"]
            lower_window = -1
            upper_window = 2
        "#;

        let config = TrainingConfig::from_toml_str(source).unwrap();
        assert_eq!(config.fit.interval_width, 0.95);
        assert_eq!(config.fit.n_changepoints, 25);

        let calendar = config.calendar.build().unwrap();
        assert_eq!(calendar.events().len(), 2);
        assert_eq!(calendar.events()[1].name, "Festival");
        assert_eq!(calendar.events()[1].upper_window, 2);
    }

    #[test]
    fn test_daily_seasonality_rejected() {
        let result = TrainingConfig::from_toml_str("[seasonality]\ndaily = true\n");
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn test_invalid_fit_settings() {
        assert!(TrainingConfig::from_toml_str("[fit]\ninterval_width = 1.5\n").is_err());
        assert!(TrainingConfig::from_toml_str("[fit]\nchangepoint_prior_scale = 0.0\n").is_err());
        assert!(matches!(
            TrainingConfig::from_toml_str("[fit]\nholidays_prior_scale = 1e-200\n"),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            TrainingConfig::from_toml_str("[fit\n"),
            Err(ForecastError::Config(_))
        ));
    }

    #[test]
    fn test_service_config_from_lookup() {
        let vars: HashMap<&str, &str> =
            [(MODEL_PATH_ENV, "/srv/model.json"), (DEFAULT_HORIZON_ENV, "14")].into();
        let config = ServiceConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.default_horizon_days, 14);

        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServiceConfig::default());

        let bad =
            ServiceConfig::from_lookup(|k| (k == DEFAULT_HORIZON_ENV).then(|| "400".to_string()));
        assert!(matches!(bad, Err(ForecastError::Config(_))));
    }
}
