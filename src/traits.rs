//! Abstractions for time and the prediction service to enable testing.
//!
//! This module provides traits for:
//! - `Clock`: Abstracting time access for deterministic testing
//! - `PredictionSource`: Abstracting the remote forecasting service so the
//!   occupancy formatter can be driven by canned data

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::predictions::{
    HourlyForecast, OfficeTimeRecommendation, PredictionRecord, Recommendation,
};

// ==================== Clock Trait ====================

/// Trait for abstracting time access.
pub trait Clock: Send + Sync {
    /// Get the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get the current time in the local timezone.
    fn now_local(&self) -> DateTime<Local>;

    /// Today's date in the local timezone.
    fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Mock clock for testing with controllable time.
#[derive(Debug, Clone)]
pub struct MockClock {
    utc_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a new mock clock set to the given UTC time.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            utc_time: Arc::new(Mutex::new(time)),
        }
    }

    /// Set the mock clock to a new time.
    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.utc_time.lock().unwrap() = time;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.utc_time.lock().unwrap();
        *time = *time + duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.utc_time.lock().unwrap()
    }

    fn now_local(&self) -> DateTime<Local> {
        self.now_utc().with_timezone(&Local)
    }

    // The mock reports dates in UTC so tests do not depend on the host timezone.
    fn today(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}

// ==================== PredictionSource Trait ====================

/// The prediction-fetch collaborator consumed by the occupancy formatter.
///
/// `Ok(None)` means the service answered without data. Errors cover transport
/// and decoding failures; the formatter logs them and degrades to empty output.
#[allow(async_fn_in_trait)]
pub trait PredictionSource {
    /// Forecast for the coming week, one record per day.
    async fn week(&self) -> Result<Option<Vec<PredictionRecord>>>;

    /// Forecast for the week starting at `date`.
    async fn week_from(&self, date: NaiveDate) -> Result<Option<Vec<PredictionRecord>>>;

    /// Forecast for today.
    async fn day(&self) -> Result<Option<PredictionRecord>>;

    /// Forecast for a specific date.
    async fn date(&self, date: NaiveDate) -> Result<Option<PredictionRecord>>;

    /// Hour-by-hour forecast for today, or for `date` when given.
    async fn hourly(&self, date: Option<NaiveDate>) -> Result<Option<HourlyForecast>>;

    async fn recommendations(&self) -> Result<Option<Vec<Recommendation>>>;

    async fn office_time_recommendations(&self) -> Result<Option<Vec<OfficeTimeRecommendation>>>;
}

/// Canned prediction source for tests.
///
/// Every endpoint answers with the configured payload, `Ok(None)` when nothing
/// was configured, or an error once `fail_with` has been called. Calls are
/// counted so tests can assert the formatter fetched exactly once.
#[derive(Debug, Clone, Default)]
pub struct MockPredictionSource {
    week: Option<Vec<PredictionRecord>>,
    day: Option<PredictionRecord>,
    hourly: Option<HourlyForecast>,
    recommendations: Option<Vec<Recommendation>>,
    office_times: Option<Vec<OfficeTimeRecommendation>>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPredictionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_week(mut self, records: Vec<PredictionRecord>) -> Self {
        self.week = Some(records);
        self
    }

    pub fn with_day(mut self, record: PredictionRecord) -> Self {
        self.day = Some(record);
        self
    }

    pub fn with_hourly(mut self, forecast: HourlyForecast) -> Self {
        self.hourly = Some(forecast);
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<Recommendation>) -> Self {
        self.recommendations = Some(recommendations);
        self
    }

    pub fn with_office_times(mut self, office_times: Vec<OfficeTimeRecommendation>) -> Self {
        self.office_times = Some(office_times);
        self
    }

    /// Make every call fail with the given message.
    pub fn fail_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Names of the endpoints called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer<T: Clone>(&self, call: String, payload: &Option<T>) -> Result<Option<T>> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(payload.clone()),
        }
    }
}

impl PredictionSource for MockPredictionSource {
    async fn week(&self) -> Result<Option<Vec<PredictionRecord>>> {
        self.answer("week".to_string(), &self.week)
    }

    async fn week_from(&self, date: NaiveDate) -> Result<Option<Vec<PredictionRecord>>> {
        self.answer(format!("week_from:{}", date), &self.week)
    }

    async fn day(&self) -> Result<Option<PredictionRecord>> {
        self.answer("day".to_string(), &self.day)
    }

    async fn date(&self, date: NaiveDate) -> Result<Option<PredictionRecord>> {
        self.answer(format!("date:{}", date), &self.day)
    }

    async fn hourly(&self, date: Option<NaiveDate>) -> Result<Option<HourlyForecast>> {
        let call = match date {
            Some(date) => format!("hourly:{}", date),
            None => "hourly".to_string(),
        };
        self.answer(call, &self.hourly)
    }

    async fn recommendations(&self) -> Result<Option<Vec<Recommendation>>> {
        self.answer("recommendations".to_string(), &self.recommendations)
    }

    async fn office_time_recommendations(&self) -> Result<Option<Vec<OfficeTimeRecommendation>>> {
        self.answer("office_time_recommendations".to_string(), &self.office_times)
    }
}
