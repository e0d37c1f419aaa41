//! # Demand Forecast
//!
//! Daily rental demand forecasting from historical completed-booking counts.
//!
//! ## Features
//!
//! - Daily observation ingestion from CSV (`ds,y` or `date,count` columns)
//! - Holiday calendar with fixed-date holidays and lunar new year windows
//! - Additive model: piecewise linear trend, weekly and yearly Fourier
//!   seasonality, per-offset holiday effects
//! - Bounded integer forecasts with uncertainty intervals
//! - JSON model persistence and a transport-free query handler
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::calendar::HolidayCalendar;
//! use demand_forecast::config::SeasonalityConfig;
//! use demand_forecast::data::DataLoader;
//! use demand_forecast::models::fit;
//! use demand_forecast::service::ForecastService;
//! use std::sync::Arc;
//!
//! let observations = DataLoader::from_csv("bookings.csv")?;
//! let calendar = HolidayCalendar::vietnam(2023, 2027)?;
//!
//! let model = fit(&observations, calendar.events(), &SeasonalityConfig::default())?;
//! demand_forecast::persistence::save(&model, "demand_model.json")?;
//!
//! let service = ForecastService::new(Arc::new(model));
//! for point in service.predict(30)? {
//!     println!("{} {} [{}, {}]", point.date, point.yhat, point.yhat_lower, point.yhat_upper);
//! }
//! # Ok::<(), demand_forecast::ForecastError>(())
//! ```

pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod query;
pub mod service;

// Re-export commonly used types
pub use crate::calendar::{HolidayCalendar, HolidayEvent};
pub use crate::config::{SeasonalityConfig, ServiceConfig, TrainingConfig};
pub use crate::data::{DailySeries, DataLoader, Observation};
pub use crate::error::ForecastError;
pub use crate::models::{DemandModel, ForecastModel, ForecastResult, ModelTrainer};
pub use crate::service::{ForecastPoint, ForecastService};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
