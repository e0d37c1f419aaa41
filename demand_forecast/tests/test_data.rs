use chrono::NaiveDate;
use demand_forecast::data::{DailySeries, DataLoader};
use demand_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ds,y").unwrap();
    writeln!(file, "2024-01-03,12").unwrap();
    writeln!(file, "2024-01-01,8").unwrap();
    writeln!(file, "2024-01-02, 10").unwrap();

    let observations = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(observations.len(), 3);

    let series = DailySeries::new(&observations).unwrap();
    assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(series.values(), vec![8.0, 10.0, 12.0]);
}

#[test]
fn test_data_loader_accepts_long_headers() {
    let csv = "date,count\n2024-05-01,3\n2024-05-02,4\n";
    let observations = DataLoader::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(observations[1].count, 4);
}

#[test]
fn test_data_loader_rejects_bad_rows() {
    assert!(matches!(
        DataLoader::from_reader("ds,y\n2024-05-01,-3\n".as_bytes()),
        Err(ForecastError::CsvError(_))
    ));
    assert!(matches!(
        DataLoader::from_reader("ds,y\nyesterday,3\n".as_bytes()),
        Err(ForecastError::CsvError(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        DataLoader::from_csv("/nonexistent/bookings.csv"),
        Err(ForecastError::IoError(_))
    ));
}
