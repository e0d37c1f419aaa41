//! Historical booking observations

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Completed bookings counted on one calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar date of the bookings
    #[serde(alias = "ds")]
    pub date: NaiveDate,
    /// Number of completed bookings on that date
    #[serde(alias = "y")]
    pub count: u32,
}

impl Observation {
    /// Create a new observation
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self { date, count }
    }
}

/// Validated daily series: non-empty, ascending, one observation per date
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    observations: Vec<Observation>,
}

impl DailySeries {
    /// Validate observations into a daily series.
    ///
    /// The input is copied and sorted by date; gaps between dates are allowed
    /// but the same date may not appear twice.
    pub fn new(observations: &[Observation]) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no historical observations supplied".to_string(),
            ));
        }

        let mut observations = observations.to_vec();
        observations.sort_by_key(|o| o.date);

        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ForecastError::DataError(format!(
                "duplicate observation for {}",
                pair[0].date
            )));
        }

        Ok(Self { observations })
    }

    /// Borrow the observations in date order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observed dates
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false for a validated series
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observed dates in ascending order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    /// Observed counts as floats, aligned with [`DailySeries::dates`]
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.count as f64).collect()
    }

    /// First observed date
    pub fn first_date(&self) -> NaiveDate {
        self.observations[0].date
    }

    /// Last observed date
    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }
}

/// Data loader for observation extracts
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load observations from a CSV file with a `ds,y` (or `date,count`) header
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load observations from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Observation>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut observations = Vec::new();
        for record in csv_reader.deserialize() {
            let observation: Observation = record?;
            observations.push(observation);
        }

        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_series_sorts_and_keeps_gaps() {
        let series = DailySeries::new(&[
            Observation::new(day(5), 3),
            Observation::new(day(1), 1),
            Observation::new(day(2), 2),
        ])
        .unwrap();

        assert_eq!(series.dates(), vec![day(1), day(2), day(5)]);
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.first_date(), day(1));
        assert_eq!(series.last_date(), day(5));
    }

    #[test]
    fn test_series_rejects_duplicates_and_empty() {
        let result = DailySeries::new(&[Observation::new(day(1), 1), Observation::new(day(1), 2)]);
        assert!(matches!(result, Err(ForecastError::DataError(_))));

        assert!(matches!(
            DailySeries::new(&[]),
            Err(ForecastError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_reader_accepts_both_headers() {
        let extract = "ds,y\n2024-03-01,4\n2024-03-02, 7\n";
        let observations = DataLoader::from_reader(extract.as_bytes()).unwrap();
        assert_eq!(observations, vec![Observation::new(day(1), 4), Observation::new(day(2), 7)]);

        let named = "date,count\n2024-03-03,1\n";
        let observations = DataLoader::from_reader(named.as_bytes()).unwrap();
        assert_eq!(observations, vec![Observation::new(day(3), 1)]);
    }

    #[test]
    fn test_reader_rejects_negative_counts() {
        let extract = "ds,y\n2024-03-01,-4\n";
        assert!(matches!(
            DataLoader::from_reader(extract.as_bytes()),
            Err(ForecastError::CsvError(_))
        ));
    }
}
