//! Holiday calendar construction
//!
//! Holidays are precomputed for a fixed span of years from two sources: a
//! table of fixed month/day holidays that recur every year, and literal dates
//! for movable feasts such as the lunar new year, which has no closed-form
//! rule without a lunar calendar. Forecast dates past the last listed lunar
//! date simply receive no adjustment for that holiday.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// First year of the built-in calendar
pub const DEFAULT_FIRST_YEAR: i32 = 2023;
/// Last year of the built-in calendar
pub const DEFAULT_LAST_YEAR: i32 = 2027;

/// Vietnamese public holidays on fixed Gregorian dates: (name, month, day)
pub const VIETNAM_FIXED_HOLIDAYS: [(&str, u32, u32); 4] = [
    ("New Year", 1, 1),
    ("Reunification Day", 4, 30),
    ("Labour Day", 5, 1),
    ("National Day", 9, 2),
];

/// Name used for the lunar new year event
pub const TET_NAME: &str = "Tet (Lunar New Year)";
/// Days before Tet with disrupted demand
pub const TET_LOWER_WINDOW: i32 = -3;
/// Days after Tet with disrupted demand
pub const TET_UPPER_WINDOW: i32 = 7;
/// First day of Tet for each covered year: (year, month, day)
pub const TET_DATES: [(i32, u32, u32); 5] = [
    (2023, 1, 22),
    (2024, 2, 10),
    (2025, 1, 29),
    (2026, 2, 17),
    (2027, 2, 6),
];

/// A named calendar effect with an inclusive influence window
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolidayEvent {
    /// Holiday name; events sharing a name share regressors
    pub name: String,
    /// Anchor date of the event
    pub date: NaiveDate,
    /// Days before the anchor covered by the event (≤ 0)
    pub lower_window: i32,
    /// Days after the anchor covered by the event (≥ 0)
    pub upper_window: i32,
}

impl HolidayEvent {
    /// Create a single-day event
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
            lower_window: 0,
            upper_window: 0,
        }
    }

    /// Extend the event's influence to neighbouring days
    pub fn with_window(mut self, lower_window: i32, upper_window: i32) -> Result<Self> {
        validate_window(&self.name, lower_window, upper_window)?;
        self.lower_window = lower_window;
        self.upper_window = upper_window;
        Ok(self)
    }

    /// Check `lower_window <= 0 <= upper_window`
    pub fn validate(&self) -> Result<()> {
        validate_window(&self.name, self.lower_window, self.upper_window)
    }

    /// Offsets covered by the window, from `lower_window` to `upper_window`
    pub fn offsets(&self) -> std::ops::RangeInclusive<i32> {
        self.lower_window..=self.upper_window
    }

    /// `(offset, date)` for every day inside the influence window
    pub fn influence_days(&self) -> impl Iterator<Item = (i32, NaiveDate)> + '_ {
        self.offsets()
            .map(move |offset| (offset, self.date + Duration::days(offset as i64)))
    }

    /// Whether `date` falls inside the influence window
    pub fn covers(&self, date: NaiveDate) -> bool {
        let delta = (date - self.date).num_days();
        delta >= self.lower_window as i64 && delta <= self.upper_window as i64
    }
}

fn validate_window(name: &str, lower_window: i32, upper_window: i32) -> Result<()> {
    if lower_window > 0 || upper_window < 0 {
        return Err(ForecastError::InvalidParameter(format!(
            "holiday '{}' window must satisfy lower <= 0 <= upper, got ({}, {})",
            name, lower_window, upper_window
        )));
    }
    Ok(())
}

/// A holiday recurring every year on the same month and day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedHoliday {
    pub name: String,
    pub month: u32,
    pub day: u32,
}

impl FixedHoliday {
    pub fn new(name: impl Into<String>, month: u32, day: u32) -> Self {
        Self {
            name: name.into(),
            month,
            day,
        }
    }
}

/// A movable holiday listed by literal date, one entry per year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunarHoliday {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub lower_window: i32,
    #[serde(default)]
    pub upper_window: i32,
}

impl LunarHoliday {
    /// Tet with its built-in dates and asymmetric window
    pub fn tet() -> Self {
        let dates = TET_DATES
            .iter()
            .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .collect();

        Self {
            name: TET_NAME.to_string(),
            dates,
            lower_window: TET_LOWER_WINDOW,
            upper_window: TET_UPPER_WINDOW,
        }
    }
}

/// Precomputed holiday events for an inclusive range of years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    first_year: i32,
    last_year: i32,
    events: Vec<HolidayEvent>,
}

/// Builder for [`HolidayCalendar`]
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendarBuilder {
    years: Option<(i32, i32)>,
    fixed: Vec<FixedHoliday>,
    lunar: Vec<LunarHoliday>,
}

impl HolidayCalendarBuilder {
    /// Inclusive year range to generate events for
    pub fn years(mut self, first_year: i32, last_year: i32) -> Self {
        self.years = Some((first_year, last_year));
        self
    }

    /// Add a fixed-date holiday
    pub fn fixed(mut self, holiday: FixedHoliday) -> Self {
        self.fixed.push(holiday);
        self
    }

    /// Add a movable holiday with literal dates
    pub fn lunar(mut self, holiday: LunarHoliday) -> Self {
        self.lunar.push(holiday);
        self
    }

    /// Generate the calendar
    pub fn build(self) -> Result<HolidayCalendar> {
        let (first_year, last_year) = self
            .years
            .unwrap_or((DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR));
        if first_year > last_year {
            return Err(ForecastError::InvalidParameter(format!(
                "calendar year range is empty: {}..={}",
                first_year, last_year
            )));
        }

        let mut events = Vec::new();

        for holiday in &self.fixed {
            check_name(&holiday.name)?;
            for year in first_year..=last_year {
                match NaiveDate::from_ymd_opt(year, holiday.month, holiday.day) {
                    Some(date) => events.push(HolidayEvent::new(holiday.name.clone(), date)),
                    None => debug!(
                        holiday = %holiday.name,
                        year,
                        "fixed holiday does not exist this year, skipping"
                    ),
                }
            }
        }

        for holiday in &self.lunar {
            check_name(&holiday.name)?;
            validate_window(&holiday.name, holiday.lower_window, holiday.upper_window)?;
            for &date in &holiday.dates {
                if date.year() < first_year || date.year() > last_year {
                    debug!(
                        holiday = %holiday.name,
                        %date,
                        "lunar date outside calendar years, dropping"
                    );
                    continue;
                }
                events.push(
                    HolidayEvent::new(holiday.name.clone(), date)
                        .with_window(holiday.lower_window, holiday.upper_window)?,
                );
            }
        }

        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        events.dedup();

        Ok(HolidayCalendar {
            first_year,
            last_year,
            events,
        })
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ForecastError::InvalidParameter(
            "holiday name must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl HolidayCalendar {
    /// Start building a calendar
    pub fn builder() -> HolidayCalendarBuilder {
        HolidayCalendarBuilder::default()
    }

    /// Vietnamese public holidays plus Tet for the given years
    pub fn vietnam(first_year: i32, last_year: i32) -> Result<Self> {
        let mut builder = Self::builder().years(first_year, last_year);
        for (name, month, day) in VIETNAM_FIXED_HOLIDAYS {
            builder = builder.fixed(FixedHoliday::new(name, month, day));
        }
        builder.lunar(LunarHoliday::tet()).build()
    }

    /// A calendar with no events, covering the given years
    pub fn empty(first_year: i32, last_year: i32) -> Result<Self> {
        Self::builder().years(first_year, last_year).build()
    }

    /// All events, sorted by date then name
    pub fn events(&self) -> &[HolidayEvent] {
        &self.events
    }

    /// First covered year
    pub fn first_year(&self) -> i32 {
        self.first_year
    }

    /// Last covered year
    pub fn last_year(&self) -> i32 {
        self.last_year
    }

    /// Last calendar date the year range covers
    pub fn last_covered_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.last_year, 12, 31)
    }

    /// Whether the inclusive date range lies within the covered years
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start.year() >= self.first_year && end.year() <= self.last_year
    }
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        // The built-in tables are static and valid
        Self::vietnam(DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR).unwrap_or(HolidayCalendar {
            first_year: DEFAULT_FIRST_YEAR,
            last_year: DEFAULT_LAST_YEAR,
            events: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_vietnam_calendar_contents() {
        let calendar = HolidayCalendar::vietnam(2023, 2027).unwrap();
        let events = calendar.events();

        // 4 fixed holidays per year plus one Tet per year
        assert_eq!(events.len(), 4 * 5 + 5);

        let tet_2025 = events
            .iter()
            .find(|e| e.name == TET_NAME && e.date == date(2025, 1, 29))
            .unwrap();
        assert_eq!(tet_2025.lower_window, -3);
        assert_eq!(tet_2025.upper_window, 7);

        let labour_days = events.iter().filter(|e| e.name == "Labour Day").count();
        assert_eq!(labour_days, 5);
        assert!(events
            .iter()
            .filter(|e| e.name != TET_NAME)
            .all(|e| e.lower_window == 0 && e.upper_window == 0));
    }

    #[test]
    fn test_events_sorted() {
        let calendar = HolidayCalendar::default();
        let events = calendar.events();
        assert!(events.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_lunar_dates_outside_range_dropped() {
        let calendar = HolidayCalendar::builder()
            .years(2024, 2025)
            .lunar(LunarHoliday::tet())
            .build()
            .unwrap();

        let dates: Vec<NaiveDate> = calendar.events().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2024, 2, 10), date(2025, 1, 29)]);
    }

    #[test]
    fn test_missing_fixed_date_skipped() {
        let calendar = HolidayCalendar::builder()
            .years(2023, 2024)
            .fixed(FixedHoliday::new("Leap Day", 2, 29))
            .build()
            .unwrap();

        assert_eq!(calendar.events().len(), 1);
        assert_eq!(calendar.events()[0].date, date(2024, 2, 29));
    }

    #[test]
    fn test_window_validation() {
        assert!(HolidayEvent::new("x", date(2024, 1, 1)).with_window(1, 2).is_err());
        assert!(HolidayEvent::new("x", date(2024, 1, 1)).with_window(-1, -1).is_err());

        let bad = LunarHoliday {
            name: "x".to_string(),
            dates: vec![date(2024, 1, 1)],
            lower_window: 2,
            upper_window: 3,
        };
        assert!(HolidayCalendar::builder().lunar(bad).build().is_err());
        assert!(HolidayCalendar::builder().years(2025, 2024).build().is_err());
    }

    #[test]
    fn test_influence_window() {
        let tet = HolidayEvent::new(TET_NAME, date(2026, 2, 17))
            .with_window(-3, 7)
            .unwrap();

        let days: Vec<(i32, NaiveDate)> = tet.influence_days().collect();
        assert_eq!(days.len(), 11);
        assert_eq!(days[0], (-3, date(2026, 2, 14)));
        assert_eq!(days[10], (7, date(2026, 2, 24)));

        assert!(tet.covers(date(2026, 2, 14)));
        assert!(tet.covers(date(2026, 2, 24)));
        assert!(!tet.covers(date(2026, 2, 13)));
        assert!(!tet.covers(date(2026, 2, 25)));
    }

    #[test]
    fn test_coverage() {
        let calendar = HolidayCalendar::vietnam(2023, 2027).unwrap();
        assert!(calendar.covers(date(2024, 1, 1), date(2027, 12, 31)));
        assert!(!calendar.covers(date(2024, 1, 1), date(2028, 1, 1)));
        assert_eq!(calendar.last_covered_date(), Some(date(2027, 12, 31)));
    }
}
