use chrono::{Datelike, Duration, NaiveDate, Weekday};
use demand_forecast::calendar::HolidayEvent;
use demand_forecast::config::SeasonalityConfig;
use demand_forecast::data::Observation;
use demand_forecast::models::{fit, TrainingWarning};
use demand_forecast::service::predict;
use demand_forecast::ForecastError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn series(counts: impl IntoIterator<Item = u32>) -> Vec<Observation> {
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| Observation::new(day(i as i64), c))
        .collect()
}

#[test]
fn test_fit_on_empty_input_fails() {
    let result = fit(&[], &[], &SeasonalityConfig::default());
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_five_observations_fit_with_warning() {
    let observations = series([4, 6, 5, 7, 6]);
    let model = fit(&observations, &[], &SeasonalityConfig::default()).unwrap();

    assert!(model.is_low_confidence());
    assert_eq!(
        model.warnings(),
        &[TrainingWarning::LowObservationCount {
            observed: 5,
            recommended: 50
        }]
    );

    let points = predict(&model, 3).unwrap();
    assert_eq!(points.len(), 3);
}

#[test]
fn test_holiday_spike_does_not_leak_into_forecast() {
    // 60 days of constant 10 with a single registered holiday at 40
    let mut counts = vec![10u32; 60];
    counts[29] = 40;
    let holidays = vec![HolidayEvent::new("Festival", day(29))];

    let model = fit(&series(counts), &holidays, &SeasonalityConfig::default()).unwrap();
    let points = predict(&model, 7).unwrap();

    assert_eq!(points[0].date, day(60));
    for point in &points {
        assert!(
            (9..=11).contains(&point.yhat),
            "expected about 10 on {}, got {}",
            point.date,
            point.yhat
        );
    }
}

#[test]
fn test_holiday_effect_confined_to_window() {
    let anchor = day(45);
    let holiday = HolidayEvent::new("Tet", anchor).with_window(-3, 7).unwrap();

    let counts = (0..90).map(|i| {
        let offset = i - 45;
        if (-3..=7).contains(&offset) {
            30
        } else {
            10
        }
    });
    let model = fit(&series(counts), &[holiday], &SeasonalityConfig::default()).unwrap();

    for offset in -3..=7 {
        let effect = model.holiday_component(anchor + Duration::days(offset)).unwrap();
        assert!(effect > 1.0, "offset {} has effect {}", offset, effect);
    }
    assert_eq!(model.holiday_component(anchor - Duration::days(4)).unwrap(), 0.0);
    assert_eq!(model.holiday_component(anchor + Duration::days(8)).unwrap(), 0.0);
}

#[test]
fn test_overlapping_holidays_are_additive() {
    let first = HolidayEvent::new("Labour Day", day(40)).with_window(0, 2).unwrap();
    let second = HolidayEvent::new("Reunification Day", day(41));

    let counts = (0..80).map(|i| match i {
        40 | 42 => 20,
        41 => 35,
        _ => 10,
    });
    let model = fit(&series(counts), &[first, second], &SeasonalityConfig::default()).unwrap();

    let shared = model.holiday_component(day(41)).unwrap();
    let single = model.holiday_component(day(40)).unwrap();
    assert!(shared > single);
}

#[test]
fn test_weekly_pattern_learned_from_noisy_history() {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::<f64>::new(0.0, 2.0).unwrap();

    let counts: Vec<u32> = (0..730)
        .map(|i| {
            let weekend = matches!(day(i).weekday(), Weekday::Sat | Weekday::Sun);
            let base = if weekend { 35.0 } else { 20.0 };
            (base + noise.sample(&mut rng)).round().max(0.0) as u32
        })
        .collect();
    let model = fit(&series(counts), &[], &SeasonalityConfig::default()).unwrap();
    assert!(!model.is_low_confidence());

    let points = predict(&model, 28).unwrap();
    let mean = |weekend: bool| {
        let selected: Vec<f64> = points
            .iter()
            .filter(|p| matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun) == weekend)
            .map(|p| p.yhat as f64)
            .collect();
        selected.iter().sum::<f64>() / selected.len() as f64
    };
    assert!(mean(true) - mean(false) > 10.0);
    assert!(model.metrics().rmse < 4.0);
}

#[test]
fn test_gaps_in_history_are_tolerated() {
    let observations: Vec<Observation> = (0..120)
        .filter(|i| i % 5 != 0)
        .map(|i| Observation::new(day(i), 12))
        .collect();
    let model = fit(&observations, &[], &SeasonalityConfig::default()).unwrap();
    assert_eq!(model.history().len(), observations.len());

    let points = predict(&model, 5).unwrap();
    assert_eq!(points[0].date, day(120));
    assert!(points.iter().all(|p| p.yhat == 12));
}

#[test]
fn test_duplicate_dates_rejected() {
    let observations = vec![Observation::new(day(0), 3), Observation::new(day(0), 4)];
    let result = fit(&observations, &[], &SeasonalityConfig::default());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_components_sum_to_total() {
    let counts = (0..100).map(|i| 10 + (i % 7) as u32 + i as u32 / 10);
    let holidays = vec![HolidayEvent::new("Festival", day(50))];
    let model = fit(&series(counts), &holidays, &SeasonalityConfig::default()).unwrap();

    let dates: Vec<NaiveDate> = (40..140).map(day).collect();
    for row in model.components(&dates).unwrap() {
        let sum = row.trend + row.weekly + row.yearly + row.holidays;
        assert!((sum - row.yhat).abs() < 1e-9);
        assert!(row.yhat_lower <= row.yhat && row.yhat <= row.yhat_upper);
    }
}
