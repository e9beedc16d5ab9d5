//! Integration tests for the occupancy formatter.
//!
//! These tests drive the formatter through `MockPredictionSource` so every
//! orchestrator runs against canned service data.

use chrono::NaiveDate;
use occupi_client::{
    MockPredictionSource, SeriesPoint, convert_values, formatted_daily_prediction_data,
    formatted_prediction_data, formatted_prediction_week_data,
    occupancy::{self, DEFAULT_FOCUS_HOURS, DEFAULT_SCALE_FACTOR},
    predictions::{HourlyForecast, HourlyPrediction, PredictionRecord},
    value_to_color,
};

fn record(date: &str, day: i64, class: i64, level: &str) -> PredictionRecord {
    PredictionRecord {
        date: Some(date.to_string()),
        day_of_week: Some(day),
        predicted_attendance_level: Some(level.to_string()),
        predicted_class: Some(class),
        ..Default::default()
    }
}

fn week() -> Vec<PredictionRecord> {
    vec![
        record("2024-08-05", 1, 0, "0-300"),
        record("2024-08-06", 2, 1, "300-450"),
        record("2024-08-07", 3, 2, "450-600"),
        record("2024-08-08", 4, 3, "600-750"),
        record("2024-08-09", 5, 4, "750-900"),
    ]
}

// ==================== Colour Scale Tests ====================

#[test]
fn test_class_colours() {
    let expected = [
        "rgb(0, 255, 0)",
        "rgb(64, 191, 0)",
        "rgb(128, 128, 0)",
        "rgb(191, 64, 0)",
        "rgb(255, 0, 0)",
    ];
    for (class, colour) in (1..=5).zip(expected) {
        assert_eq!(value_to_color(class as f64), colour, "class {}", class);
    }
}

#[test]
fn test_colour_clamping() {
    assert_eq!(value_to_color(0.0), value_to_color(1.0));
    assert_eq!(value_to_color(-3.5), value_to_color(1.0));
    assert_eq!(value_to_color(6.0), value_to_color(5.0));
    assert_eq!(value_to_color(100.0), value_to_color(5.0));
}

// ==================== Bar Height Tests ====================

#[test]
fn test_convert_values_full_week() {
    let labels = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let series: Vec<_> = labels
        .iter()
        .zip(1..=7)
        .map(|(label, value)| SeriesPoint::new(label, value as f64))
        .collect();

    let converted = convert_values(&series, DEFAULT_SCALE_FACTOR);

    let expected = [150.0, 450.0, 750.0, 1050.0, 1350.0, 6.0, 7.0];
    for ((point, label), value) in converted.iter().zip(labels).zip(expected) {
        assert_eq!(point.label.as_deref(), Some(label));
        assert_eq!(point.value, Some(value));
    }
}

// ==================== Orchestrator Tests ====================

#[tokio::test]
async fn test_weekly_series() {
    let source = MockPredictionSource::new().with_week(week());

    let series = formatted_prediction_data(&source).await;

    let labels: Vec<_> = series.iter().map(|p| p.label.as_deref().unwrap()).collect();
    let values: Vec<_> = series.iter().map(|p| p.value.unwrap()).collect();
    assert_eq!(labels, vec!["Mon", "Tue", "Wed", "Thu", "Fri"]);
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_weekly_series_empty_array() {
    let source = MockPredictionSource::new().with_week(vec![]);
    assert_eq!(formatted_prediction_data(&source).await, vec![]);
}

#[tokio::test]
async fn test_weekly_series_no_data_or_failure() {
    let empty = MockPredictionSource::new();
    assert!(formatted_prediction_data(&empty).await.is_empty());

    let failing = MockPredictionSource::new().fail_with("connection refused");
    assert!(formatted_prediction_data(&failing).await.is_empty());
}

#[tokio::test]
async fn test_week_from_date_passes_date() {
    let source = MockPredictionSource::new().with_week(week());
    let date = NaiveDate::from_ymd_opt(2024, 8, 5).unwrap();

    let series = formatted_prediction_week_data(&source, date).await;

    assert_eq!(series.len(), 5);
    assert_eq!(source.calls(), vec!["week_from:2024-08-05"]);
}

#[tokio::test]
async fn test_weekly_series_extreme_class_does_not_panic() {
    let mut records = week();
    records[0].predicted_class = Some(i64::MAX);
    let source = MockPredictionSource::new()
        .with_week(records)
        .with_day(PredictionRecord {
            predicted_class: Some(i64::MAX),
            ..Default::default()
        });

    let series = formatted_prediction_data(&source).await;
    assert_eq!(series.len(), 5);
    assert_eq!(series[0].value, Some(i64::MAX as f64));
    assert_eq!(series[1].value, Some(2.0));

    let summary = formatted_daily_prediction_data(&source).await.unwrap();
    assert_eq!(summary.class, Some(i64::MAX));
}

#[tokio::test]
async fn test_daily_summary() {
    let source = MockPredictionSource::new().with_day(record("2024-08-07", 3, 2, "450-600"));

    let summary = formatted_daily_prediction_data(&source).await.unwrap();

    assert_eq!(summary.date.as_deref(), Some("2024-08-07"));
    assert_eq!(summary.day.as_deref(), Some("Wed"));
    assert_eq!(summary.class, Some(3));
    assert_eq!(summary.attendance.as_deref(), Some("450-600"));
}

#[tokio::test]
async fn test_daily_summary_absent() {
    let source = MockPredictionSource::new();
    assert_eq!(formatted_daily_prediction_data(&source).await, None);

    let failing = MockPredictionSource::new().fail_with("timeout");
    assert_eq!(formatted_daily_prediction_data(&failing).await, None);
}

#[tokio::test]
async fn test_formatters_are_idempotent() {
    let source = MockPredictionSource::new()
        .with_week(week())
        .with_day(record("2024-08-07", 3, 2, "450-600"));

    assert_eq!(
        formatted_prediction_data(&source).await,
        formatted_prediction_data(&source).await
    );
    assert_eq!(
        formatted_daily_prediction_data(&source).await,
        formatted_daily_prediction_data(&source).await
    );
}

#[tokio::test]
async fn test_hourly_series() {
    let hours = [7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17];
    let forecast = HourlyForecast {
        date: Some("2024-08-07".to_string()),
        hourly_predictions: hours
            .iter()
            .map(|&hour| HourlyPrediction {
                hour,
                predicted_attendance_level: Some("100-200".to_string()),
                predicted_class: Some(2),
            })
            .collect(),
        ..Default::default()
    };
    let source = MockPredictionSource::new().with_hourly(forecast);

    let midpoints = occupancy::hourly_attendance_midpoints(&source, None, &DEFAULT_FOCUS_HOURS).await;
    assert_eq!(midpoints.len(), DEFAULT_FOCUS_HOURS.len());
    assert_eq!(midpoints[0].label.as_deref(), Some("7:00"));
    assert_eq!(midpoints[0].value, Some(150.0));

    let date = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();
    let classes = occupancy::hourly_classes(&source, Some(date), &DEFAULT_FOCUS_HOURS).await;
    assert!(classes.iter().all(|p| p.value == Some(2.0)));
    assert_eq!(source.calls(), vec!["hourly", "hourly:2024-08-07"]);
}

#[tokio::test]
async fn test_hourly_midpoints_for_a_date() {
    let forecast = HourlyForecast {
        date: Some("2025-09-23".to_string()),
        hourly_predictions: vec![HourlyPrediction {
            hour: 9,
            predicted_attendance_level: Some("200-400".to_string()),
            predicted_class: Some(3),
        }],
        ..Default::default()
    };
    let source = MockPredictionSource::new().with_hourly(forecast);
    let date = NaiveDate::from_ymd_opt(2025, 9, 23).unwrap();

    let midpoints = occupancy::hourly_attendance_midpoints(&source, Some(date), &[9]).await;

    assert_eq!(midpoints, vec![SeriesPoint::new("9:00", 300.0)]);
    assert_eq!(source.calls(), vec!["hourly:2025-09-23"]);
}
