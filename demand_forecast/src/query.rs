//! Query-string handling for the forecast endpoint
//!
//! The transport is not part of this crate; a host maps
//! `GET forecast?horizon_days=N` onto [`handle_forecast_query`] and writes the
//! returned JSON.

use crate::error::{ForecastError, Result};
use crate::service::{ForecastPoint, ForecastService};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::form_urlencoded;

/// Query parameter holding the horizon
pub const HORIZON_PARAM: &str = "horizon_days";
/// Older name of [`HORIZON_PARAM`], still accepted
pub const HORIZON_PARAM_ALIAS: &str = "days_to_forecast";

/// Parsed forecast request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastQuery {
    pub horizon_days: i64,
}

impl ForecastQuery {
    /// Parse `forecast?horizon_days=N`, `?horizon_days=N` or a bare query string.
    ///
    /// Keys and values are form-urlencoded. A missing horizon falls back to
    /// `default_horizon`. When both parameter names are present the primary
    /// one wins. Range checking is left to the service.
    pub fn parse(query: &str, default_horizon: i64) -> Result<Self> {
        let query = query.trim();
        let params = match query.split_once('?') {
            Some((_, params)) => params,
            None if query.contains('=') => query,
            None => "",
        };

        let mut primary = None;
        let mut alias = None;
        for (key, value) in form_urlencoded::parse(params.as_bytes()) {
            match key.as_ref() {
                HORIZON_PARAM => primary = Some(value.into_owned()),
                HORIZON_PARAM_ALIAS => alias = Some(value.into_owned()),
                _ => {}
            }
        }

        let horizon_days = match primary.or(alias) {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                ForecastError::InvalidParameter(format!(
                    "{} must be an integer, got '{}'",
                    HORIZON_PARAM, raw
                ))
            })?,
            None => default_horizon,
        };

        Ok(Self { horizon_days })
    }
}

/// Structured error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: String,
}

impl From<&ForecastError> for ErrorPayload {
    fn from(err: &ForecastError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

/// Response body of the forecast endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Forecast(Vec<ForecastPoint>),
    Error(ErrorPayload),
}

impl QueryResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryResponse::Error(_))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON body for the wire; a serialization failure becomes an error body
    pub fn to_body(&self) -> String {
        self.to_json().unwrap_or_else(|err| error_body(&err))
    }
}

fn error_body(err: &ForecastError) -> String {
    json!({ "error": err.to_string(), "kind": err.kind() }).to_string()
}

impl From<Result<Vec<ForecastPoint>>> for QueryResponse {
    fn from(result: Result<Vec<ForecastPoint>>) -> Self {
        match result {
            Ok(points) => QueryResponse::Forecast(points),
            Err(err) => QueryResponse::Error(ErrorPayload::from(&err)),
        }
    }
}

/// Answer one forecast query. Failures become an error payload, never a panic.
pub fn handle_forecast_query(
    service: &ForecastService,
    query: &str,
    default_horizon: i64,
) -> QueryResponse {
    ForecastQuery::parse(query, default_horizon)
        .and_then(|q| service.predict(q.horizon_days))
        .into()
}
