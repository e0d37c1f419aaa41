//! # Demand Forecast Workspace
//!
//! Umbrella crate for the rental demand forecasting workspace.
//!
//! - [`demand_forecast`]: observations, holiday calendar, model training,
//!   forecasting service and query handling
//! - [`forecast_math`]: design matrices, Cholesky factorization, ridge
//!   regression and Fourier terms
//!
//! ## Example
//!
//! ```
//! use demand_forecast_workspace::demand_forecast::service::Horizon;
//!
//! assert!(Horizon::new(30).is_ok());
//! assert!(Horizon::new(0).is_err());
//! ```

pub use demand_forecast;
pub use forecast_math;
