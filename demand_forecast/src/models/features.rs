//! Design matrix layout of the additive demand model
//!
//! Columns, in order:
//!
//! 1. trend: intercept, base slope, one hinge `(t - s_j)+` per changepoint
//! 2. one block of `2·order` Fourier columns per seasonal term
//! 3. one indicator per `(holiday name, window offset)`
//!
//! `t` is the date scaled so the first historical date is 0 and the last is
//! 1. Fourier phases use days since 1970-01-01 so they do not depend on the
//! history start.

use crate::calendar::HolidayEvent;
use crate::config::{FitSettings, SeasonalityConfig};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use forecast_math::{fourier_terms, DesignMatrix};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

/// Days per week
pub const WEEKLY_PERIOD: f64 = 7.0;
/// Mean days per Gregorian year
pub const YEARLY_PERIOD: f64 = 365.25;

/// Penalty applied to intercept and base slope
const UNPENALIZED: f64 = 0.0;

/// A periodic component expanded into Fourier columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTerm {
    pub name: String,
    pub period: f64,
    pub order: usize,
}

impl SeasonalTerm {
    fn width(&self) -> usize {
        2 * self.order
    }
}

/// One holiday regressor: a named event on a specific window offset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolidayColumn {
    pub name: String,
    pub offset: i32,
}

/// Everything needed to turn a date into a design row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayout {
    start: NaiveDate,
    span_days: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<SeasonalTerm>,
    holiday_columns: Vec<HolidayColumn>,
    holidays: Vec<HolidayEvent>,
}

impl FeatureLayout {
    /// Derive the layout from the (ascending) historical dates
    pub fn new(
        history: &[NaiveDate],
        holidays: &[HolidayEvent],
        seasonality: &SeasonalityConfig,
        settings: &FitSettings,
    ) -> Result<Self> {
        let (start, end) = match (history.first(), history.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                return Err(ForecastError::InsufficientData(
                    "cannot lay out features without history".to_string(),
                ))
            }
        };
        for event in holidays {
            event.validate()?;
        }
        let span_days = ((end - start).num_days() as f64).max(1.0);

        let changepoints = select_changepoints(history, settings)
            .into_iter()
            .map(|date| (date - start).num_days() as f64 / span_days)
            .collect();

        let mut seasonalities = Vec::new();
        if seasonality.weekly {
            seasonalities.push(SeasonalTerm {
                name: "weekly".to_string(),
                period: WEEKLY_PERIOD,
                order: seasonality.weekly_order,
            });
        }
        if seasonality.yearly {
            seasonalities.push(SeasonalTerm {
                name: "yearly".to_string(),
                period: YEARLY_PERIOD,
                order: seasonality.yearly_order,
            });
        }

        let mut holiday_columns: Vec<HolidayColumn> = Vec::new();
        for event in holidays {
            for offset in event.offsets() {
                let column = HolidayColumn {
                    name: event.name.clone(),
                    offset,
                };
                if !holiday_columns.contains(&column) {
                    holiday_columns.push(column);
                }
            }
        }

        Ok(Self {
            start,
            span_days,
            changepoints,
            seasonalities,
            holiday_columns,
            holidays: holidays.to_vec(),
        })
    }

    /// Total number of design columns
    pub fn n_columns(&self) -> usize {
        self.holiday_range().end
    }

    /// Columns of the trend (intercept, slope, changepoint hinges)
    pub fn trend_range(&self) -> Range<usize> {
        0..2 + self.changepoints.len()
    }

    /// Columns of the changepoint hinges only
    pub fn changepoint_range(&self) -> Range<usize> {
        2..2 + self.changepoints.len()
    }

    /// Columns of every seasonal term, paired with the term
    pub fn seasonal_ranges(&self) -> Vec<(&SeasonalTerm, Range<usize>)> {
        let mut next = self.trend_range().end;
        self.seasonalities
            .iter()
            .map(|term| {
                let range = next..next + term.width();
                next = range.end;
                (term, range)
            })
            .collect()
    }

    /// Columns of the holiday indicators
    pub fn holiday_range(&self) -> Range<usize> {
        let start = self.trend_range().end
            + self.seasonalities.iter().map(SeasonalTerm::width).sum::<usize>();
        start..start + self.holiday_columns.len()
    }

    /// Changepoint locations in scaled time
    pub fn changepoints(&self) -> &[f64] {
        &self.changepoints
    }

    /// Holiday regressors in column order
    pub fn holiday_columns(&self) -> &[HolidayColumn] {
        &self.holiday_columns
    }

    /// Holiday events the model was fitted with
    pub fn holidays(&self) -> &[HolidayEvent] {
        &self.holidays
    }

    /// Date scaled so the history spans `[0, 1]`
    pub fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// Ridge penalty per column: `1 / prior_scale²`
    pub fn penalties(&self, settings: &FitSettings) -> Vec<f64> {
        let mut penalties = vec![UNPENALIZED; 2];
        penalties.extend(
            std::iter::repeat(prior_penalty(settings.changepoint_prior_scale))
                .take(self.changepoints.len()),
        );
        for term in &self.seasonalities {
            penalties.extend(
                std::iter::repeat(prior_penalty(settings.seasonality_prior_scale))
                    .take(term.width()),
            );
        }
        penalties.extend(
            std::iter::repeat(prior_penalty(settings.holidays_prior_scale))
                .take(self.holiday_columns.len()),
        );
        penalties
    }

    /// Build the design matrix for a sequence of dates
    pub fn design(&self, dates: &[NaiveDate]) -> Result<DesignMatrix> {
        let holiday_index = self.holiday_index();
        let mut design = DesignMatrix::new(self.n_columns())?;
        let mut row = Vec::with_capacity(self.n_columns());

        for &date in dates {
            row.clear();

            let t = self.scaled_time(date);
            row.push(1.0);
            row.push(t);
            row.extend(self.changepoints.iter().map(|&s| (t - s).max(0.0)));

            let epoch_days = days_since_epoch(date);
            for term in &self.seasonalities {
                row.extend(fourier_terms(epoch_days, term.period, term.order));
            }

            let holiday_start = row.len();
            row.resize(holiday_start + self.holiday_columns.len(), 0.0);
            if let Some(columns) = holiday_index.get(&date) {
                for &column in columns {
                    row[holiday_start + column] = 1.0;
                }
            }

            design.push_row(&row)?;
        }

        Ok(design)
    }

    /// Map each date inside some influence window to its active holiday columns
    fn holiday_index(&self) -> HashMap<NaiveDate, Vec<usize>> {
        let positions: HashMap<(&str, i32), usize> = self
            .holiday_columns
            .iter()
            .enumerate()
            .map(|(i, c)| ((c.name.as_str(), c.offset), i))
            .collect();

        let mut index: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
        for event in &self.holidays {
            for (offset, date) in event.influence_days() {
                if let Some(&column) = positions.get(&(event.name.as_str(), offset)) {
                    let active = index.entry(date).or_default();
                    if !active.contains(&column) {
                        active.push(column);
                    }
                }
            }
        }
        index
    }
}

fn prior_penalty(prior_scale: f64) -> f64 {
    1.0 / (prior_scale * prior_scale)
}

fn days_since_epoch(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

/// Evenly spaced changepoint dates within the first `changepoint_range` of the history
fn select_changepoints(history: &[NaiveDate], settings: &FitSettings) -> Vec<NaiveDate> {
    let hist_size = (history.len() as f64 * settings.changepoint_range).floor() as usize;
    let n_changepoints = settings.n_changepoints.min(hist_size.saturating_sub(1));
    if n_changepoints == 0 {
        return Vec::new();
    }

    let last_index = (hist_size - 1) as f64;
    let mut dates: Vec<NaiveDate> = (1..=n_changepoints)
        .map(|i| {
            let index = (i as f64 * last_index / n_changepoints as f64).round() as usize;
            history[index]
        })
        .collect();
    dates.dedup();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn days(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    #[test]
    fn test_column_layout() {
        let history = days(100);
        let tet = HolidayEvent::new("Tet", history[50]).with_window(-3, 7).unwrap();
        let new_year = HolidayEvent::new("New Year", history[0]);

        let layout = FeatureLayout::new(
            &history,
            &[new_year, tet],
            &SeasonalityConfig::default(),
            &FitSettings::default(),
        )
        .unwrap();

        assert_eq!(layout.changepoints().len(), 25);
        assert_eq!(layout.trend_range(), 0..27);
        let seasonal = layout.seasonal_ranges();
        assert_eq!(seasonal[0].1, 27..33);
        assert_eq!(seasonal[1].1, 33..53);
        assert_eq!(layout.holiday_range(), 53..65);
        assert_eq!(layout.n_columns(), 65);
        assert_eq!(layout.penalties(&FitSettings::default()).len(), 65);
    }

    #[test]
    fn test_changepoints_inside_range() {
        let history = days(10);
        let layout = FeatureLayout::new(
            &history,
            &[],
            &SeasonalityConfig::default(),
            &FitSettings::default(),
        )
        .unwrap();

        // floor(10 * 0.8) = 8 candidate points, so at most 7 changepoints
        assert_eq!(layout.changepoints().len(), 7);
        assert!(layout.changepoints().iter().all(|&s| s > 0.0 && s <= 7.0 / 9.0));
        assert!(layout.changepoints().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_observation_has_no_changepoints() {
        let history = days(1);
        let layout = FeatureLayout::new(
            &history,
            &[],
            &SeasonalityConfig::default(),
            &FitSettings::default(),
        )
        .unwrap();
        assert!(layout.changepoints().is_empty());
        assert_eq!(layout.scaled_time(history[0]), 0.0);
    }

    #[test]
    fn test_holiday_indicators_follow_window() {
        let history = days(30);
        let anchor = history[10];
        let event = HolidayEvent::new("Festival", anchor).with_window(-1, 2).unwrap();
        let no_seasons = SeasonalityConfig {
            weekly: false,
            yearly: false,
            ..SeasonalityConfig::default()
        };

        let layout =
            FeatureLayout::new(&history, &[event], &no_seasons, &FitSettings::default()).unwrap();
        let design = layout.design(&history).unwrap();
        let holidays = layout.holiday_range();

        for (i, row) in design.iter_rows().enumerate() {
            let active: Vec<f64> = row[holidays.clone()].to_vec();
            let expected_on = (9..=12).contains(&i);
            assert_eq!(active.iter().sum::<f64>(), if expected_on { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn test_inverted_window_rejected() {
        let history = days(10);
        let mut event = HolidayEvent::new("Festival", history[3]);
        event.upper_window = -1;

        let result = FeatureLayout::new(
            &history,
            &[event],
            &SeasonalityConfig::default(),
            &FitSettings::default(),
        );
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn test_overlapping_events_are_additive() {
        let history = days(10);
        let a = HolidayEvent::new("A", history[4]).with_window(0, 2).unwrap();
        let b = HolidayEvent::new("B", history[5]);

        let layout = FeatureLayout::new(
            &history,
            &[a, b],
            &SeasonalityConfig::default(),
            &FitSettings::default(),
        )
        .unwrap();
        let design = layout.design(&history[5..6]).unwrap();
        let active = design.row(0)[layout.holiday_range()].iter().sum::<f64>();
        assert_eq!(active, 2.0);
    }
}
