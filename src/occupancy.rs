//! Occupancy prediction formatting.
//!
//! Turns raw forecast records from the prediction service into chart-ready
//! shapes: weekday-labelled series, a single-day summary, hourly series and a
//! red-to-green severity colour scale. Everything here is pure except the
//! `*_data` / `hourly_*` orchestrators, which await exactly one call on a
//! [`PredictionSource`] and never propagate its failures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    predictions::{HourlyForecast, OfficeTimeRecommendation, PredictionRecord, Recommendation},
    traits::PredictionSource,
};

/// Day labels indexed by the service's day-of-week number (0 = Sunday).
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Default base height for [`convert_values`] and [`convert_hourly_values`].
pub const DEFAULT_SCALE_FACTOR: f64 = 150.0;

/// Offset between the service's `Predicted_Class` and the displayed class.
pub const CLASS_DISPLAY_OFFSET: i64 = 1;

pub const MIN_CLASS: f64 = 1.0;
pub const MAX_CLASS: f64 = 5.0;

/// Hours shown on the hourly charts by default.
pub const DEFAULT_FOCUS_HOURS: [u32; 7] = [7, 9, 11, 12, 13, 15, 17];

// ==================== Types ====================

/// The four fields of a prediction record the UI consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPrediction {
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Day_of_week")]
    pub day_of_week: Option<i64>,
    #[serde(rename = "Predicted_Attendance_Level")]
    pub predicted_attendance_level: Option<String>,
    #[serde(rename = "Predicted_Class")]
    pub predicted_class: Option<i64>,
}

/// A `{value, label}` pair ready for a chart widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub value: Option<f64>,
    pub label: Option<String>,
}

impl SeriesPoint {
    pub fn new(label: &str, value: f64) -> Self {
        Self {
            value: Some(value),
            label: Some(label.to_string()),
        }
    }
}

/// Display summary of a single day's forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: Option<String>,
    pub day: Option<String>,
    pub class: Option<i64>,
    pub attendance: Option<String>,
}

// ==================== Pure Transformations ====================

pub fn extract_prediction(record: &PredictionRecord) -> ExtractedPrediction {
    ExtractedPrediction {
        date: record.date.clone(),
        day_of_week: record.day_of_week,
        predicted_attendance_level: record.predicted_attendance_level.clone(),
        predicted_class: record.predicted_class,
    }
}

pub fn extract_predictions(records: &[PredictionRecord]) -> Vec<ExtractedPrediction> {
    records.iter().map(extract_prediction).collect()
}

/// Short day label for a day-of-week number, `None` outside `0..=6`.
pub fn weekday_label(day: i64) -> Option<&'static str> {
    usize::try_from(day)
        .ok()
        .and_then(|idx| WEEKDAY_LABELS.get(idx))
        .copied()
}

/// Saturates at `i64::MAX` for out-of-range classes.
pub fn display_class(predicted_class: i64) -> i64 {
    predicted_class.saturating_add(CLASS_DISPLAY_OFFSET)
}

/// Weekly series point for one extracted prediction.
pub fn series_point(prediction: &ExtractedPrediction) -> SeriesPoint {
    SeriesPoint {
        value: prediction.predicted_class.map(|c| display_class(c) as f64),
        label: prediction
            .day_of_week
            .and_then(weekday_label)
            .map(str::to_string),
    }
}

pub fn daily_summary(prediction: &ExtractedPrediction) -> DailySummary {
    DailySummary {
        date: prediction.date.clone(),
        day: prediction
            .day_of_week
            .and_then(weekday_label)
            .map(str::to_string),
        class: prediction.predicted_class.map(display_class),
        attendance: prediction.predicted_attendance_level.clone(),
    }
}

/// Map a severity class (1..=5) onto its calibrated weekday bar height.
fn weekday_bar_height(value: f64, scale_factor: f64) -> Option<f64> {
    let is_class = value.fract() == 0.0 && (MIN_CLASS..=MAX_CLASS).contains(&value);
    is_class.then(|| scale_factor * (2.0 * value - 1.0))
}

/// Scale the Monday-Friday points of a weekly series to bar heights.
///
/// Classes 1 to 5 become `150, 450, 750, 1050, 1350` with the default factor.
/// Points beyond the fifth, absent values and values outside the class range
/// are returned unchanged.
pub fn convert_values(series: &[SeriesPoint], scale_factor: f64) -> Vec<SeriesPoint> {
    series
        .iter()
        .enumerate()
        .map(|(idx, point)| {
            if idx >= 5 {
                return point.clone();
            }
            let value = point
                .value
                .map(|v| weekday_bar_height(v, scale_factor).unwrap_or(v));
            SeriesPoint {
                value,
                label: point.label.clone(),
            }
        })
        .collect()
}

/// Hourly variant of [`convert_values`]: classes 1 to 4 become
/// `450, 750, 1050, 1350` with the default factor, applied to every point.
pub fn convert_hourly_values(series: &[SeriesPoint], scale_factor: f64) -> Vec<SeriesPoint> {
    series
        .iter()
        .map(|point| {
            let value = point.value.map(|v| {
                if v.fract() == 0.0 && (1.0..=4.0).contains(&v) {
                    scale_factor * (2.0 * v + 1.0)
                } else {
                    v
                }
            });
            SeriesPoint {
                value,
                label: point.label.clone(),
            }
        })
        .collect()
}

/// Severity colour on the default 1..=5 class scale.
pub fn value_to_color(value: f64) -> String {
    value_to_color_in_range(value, MIN_CLASS, MAX_CLASS)
}

/// Linear green (low) to red (high) gradient, formatted as `rgb(r, g, b)`.
///
/// Out-of-range values are clamped, so anything below `min` is pure green and
/// anything above `max` pure red.
pub fn value_to_color_in_range(value: f64, min: f64, max: f64) -> String {
    let t = if !value.is_finite() || max <= min {
        0.0
    } else {
        (value.clamp(min, max) - min) / (max - min)
    };

    let red = (255.0 * t).round() as u8;
    let green = (255.0 * (1.0 - t)).round() as u8;

    format!("rgb({}, {}, {})", red, green, 0)
}

/// Midpoint of a `"min-max"` attendance range, e.g. `"50-100"` -> 75.
pub fn attendance_midpoint(level: &str) -> Option<f64> {
    let (low, high) = level.split_once('-')?;
    let low: f64 = low.trim().parse().ok()?;
    let high: f64 = high.trim().parse().ok()?;
    Some((low + high) / 2.0)
}

fn hour_label(hour: u32) -> String {
    format!("{}:00", hour)
}

/// Hourly series of attendance-range midpoints for the given hours.
pub fn hourly_midpoint_series(forecast: &HourlyForecast, hours: &[u32]) -> Vec<SeriesPoint> {
    forecast
        .hourly_predictions
        .iter()
        .filter(|p| hours.contains(&p.hour))
        .map(|p| SeriesPoint {
            value: p
                .predicted_attendance_level
                .as_deref()
                .and_then(attendance_midpoint),
            label: Some(hour_label(p.hour)),
        })
        .collect()
}

/// Hourly series of raw predicted classes for the given hours.
pub fn hourly_class_series(forecast: &HourlyForecast, hours: &[u32]) -> Vec<SeriesPoint> {
    forecast
        .hourly_predictions
        .iter()
        .filter(|p| hours.contains(&p.hour))
        .map(|p| SeriesPoint {
            value: p.predicted_class.map(|c| c as f64),
            label: Some(hour_label(p.hour)),
        })
        .collect()
}

// ==================== Orchestrators ====================

pub async fn extracted_predictions<P: PredictionSource>(
    source: &P,
) -> Option<Vec<ExtractedPrediction>> {
    match source.week().await {
        Ok(Some(records)) => Some(extract_predictions(&records)),
        Ok(None) => {
            tracing::error!("No predictions data received");
            None
        }
        Err(e) => {
            tracing::error!("Error fetching weekly predictions: {:#}", e);
            None
        }
    }
}

pub async fn extracted_predictions_from<P: PredictionSource>(
    source: &P,
    date: NaiveDate,
) -> Option<Vec<ExtractedPrediction>> {
    match source.week_from(date).await {
        Ok(Some(records)) => Some(extract_predictions(&records)),
        Ok(None) => {
            tracing::error!("No predictions data received for week of {}", date);
            None
        }
        Err(e) => {
            tracing::error!("Error fetching predictions for week of {}: {:#}", date, e);
            None
        }
    }
}

pub async fn extracted_daily_prediction<P: PredictionSource>(
    source: &P,
) -> Option<ExtractedPrediction> {
    match source.day().await {
        Ok(Some(record)) => Some(extract_prediction(&record)),
        Ok(None) => {
            tracing::error!("No predictions data received");
            None
        }
        Err(e) => {
            tracing::error!("Error fetching daily prediction: {:#}", e);
            None
        }
    }
}

/// Weekly forecast as a weekday-labelled series; empty when nothing came back.
pub async fn formatted_prediction_data<P: PredictionSource>(source: &P) -> Vec<SeriesPoint> {
    extracted_predictions(source)
        .await
        .map(|data| data.iter().map(series_point).collect())
        .unwrap_or_default()
}

pub async fn formatted_prediction_week_data<P: PredictionSource>(
    source: &P,
    date: NaiveDate,
) -> Vec<SeriesPoint> {
    extracted_predictions_from(source, date)
        .await
        .map(|data| data.iter().map(series_point).collect())
        .unwrap_or_default()
}

/// Today's forecast summary, `None` when the service had nothing.
pub async fn formatted_daily_prediction_data<P: PredictionSource>(
    source: &P,
) -> Option<DailySummary> {
    extracted_daily_prediction(source)
        .await
        .map(|prediction| daily_summary(&prediction))
}

async fn hourly_forecast<P: PredictionSource>(
    source: &P,
    date: Option<NaiveDate>,
) -> Option<HourlyForecast> {
    match source.hourly(date).await {
        Ok(Some(forecast)) => Some(forecast),
        Ok(None) => {
            tracing::error!("No hourly predictions data received");
            None
        }
        Err(e) => {
            tracing::error!("Error fetching hourly predictions: {:#}", e);
            None
        }
    }
}

pub async fn hourly_attendance_midpoints<P: PredictionSource>(
    source: &P,
    date: Option<NaiveDate>,
    hours: &[u32],
) -> Vec<SeriesPoint> {
    hourly_forecast(source, date)
        .await
        .map(|forecast| hourly_midpoint_series(&forecast, hours))
        .unwrap_or_default()
}

pub async fn hourly_classes<P: PredictionSource>(
    source: &P,
    date: Option<NaiveDate>,
    hours: &[u32],
) -> Vec<SeriesPoint> {
    hourly_forecast(source, date)
        .await
        .map(|forecast| hourly_class_series(&forecast, hours))
        .unwrap_or_default()
}

/// Recommendations that carry a title or description; empty on failure.
pub async fn formatted_recommendations<P: PredictionSource>(source: &P) -> Vec<Recommendation> {
    match source.recommendations().await {
        Ok(Some(recommendations)) => recommendations
            .into_iter()
            .filter(|r| r.title.is_some() || r.description.is_some())
            .collect(),
        Ok(None) => {
            tracing::error!("No recommendations received");
            Vec::new()
        }
        Err(e) => {
            tracing::error!("Error fetching recommendations: {:#}", e);
            Vec::new()
        }
    }
}

pub async fn formatted_office_time_recommendations<P: PredictionSource>(
    source: &P,
) -> Vec<OfficeTimeRecommendation> {
    match source.office_time_recommendations().await {
        Ok(Some(times)) => times.into_iter().filter(|t| t.day.is_some()).collect(),
        Ok(None) => {
            tracing::error!("No office time recommendations received");
            Vec::new()
        }
        Err(e) => {
            tracing::error!("Error fetching office time recommendations: {:#}", e);
            Vec::new()
        }
    }
}

// ==================== Tests ====================
