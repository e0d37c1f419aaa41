use chrono::{Datelike, Duration, NaiveDate, Weekday};
use demand_forecast::calendar::HolidayCalendar;
use demand_forecast::config::SeasonalityConfig;
use demand_forecast::data::Observation;
use demand_forecast::models::fit;
use demand_forecast::service::ForecastService;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Demand Forecast: Basic Forecasting Example");
    println!("==========================================\n");

    println!("Creating sample data...");
    let observations = create_sample_bookings();
    println!("Sample data created: {} days\n", observations.len());

    let calendar = HolidayCalendar::vietnam(2023, 2027)?;
    println!("Holiday calendar: {} events", calendar.events().len());

    println!("Training model...");
    let model = fit(&observations, calendar.events(), &SeasonalityConfig::default())?;
    println!("In-sample accuracy: {}\n", model.metrics());
    for warning in model.warnings() {
        println!("Warning: {}", warning);
    }

    let service = ForecastService::new(Arc::new(model));
    let forecast = service.predict(14)?;

    println!("Forecast for the next 14 days:");
    for point in &forecast {
        println!(
            "  {} ({:?}): {:>3} bookings  [{:>3}, {:>3}]",
            point.date,
            point.date.weekday(),
            point.yhat,
            point.yhat_lower,
            point.yhat_upper
        );
    }

    println!("\nJSON response:");
    println!("{}", serde_json::to_string_pretty(&forecast)?);

    Ok(())
}

/// Two years of bookings with a weekend peak and a Tet surge
fn create_sample_bookings() -> Vec<Observation> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default();
    let tet = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap_or_default();

    (0..730)
        .map(|i| {
            let date = start + Duration::days(i);
            let mut count = 20.0 + i as f64 * 0.02;
            if matches!(date.weekday(), Weekday::Fri | Weekday::Sat) {
                count += 8.0;
            }
            let offset = (date - tet).num_days();
            if (-3..=7).contains(&offset) {
                count += 25.0;
            }
            Observation::new(date, count.round() as u32)
        })
        .collect()
}
