use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use crate::{config::NetworkConfig, traits::PredictionSource};

/// Raw forecast for one day, as emitted by the prediction service.
///
/// Every field is optional: a record missing a field is passed through and the
/// gap surfaces as an absent value in the formatted output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PredictionRecord {
    #[serde(rename = "Date", default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(rename = "Day_of_Week", alias = "Day_of_week", default)]
    pub day_of_week: Option<i64>,
    #[serde(rename = "Day_of_month", default)]
    pub day_of_month: Option<i64>,
    #[serde(rename = "Is_Weekend", default)]
    pub is_weekend: Option<bool>,
    #[serde(rename = "Month", default)]
    pub month: Option<i64>,
    #[serde(rename = "Predicted_Attendance_Level", default)]
    pub predicted_attendance_level: Option<String>,
    #[serde(rename = "Predicted_Class", default)]
    pub predicted_class: Option<i64>,
    #[serde(rename = "Special_Event", default)]
    pub special_event: Option<serde_json::Value>,
}

/// Forecast for a single hour within an [`HourlyForecast`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HourlyPrediction {
    #[serde(rename = "Hour")]
    pub hour: u32,
    /// Head-count range such as `"50-100"`.
    #[serde(rename = "Predicted_Attendance_Level", default)]
    pub predicted_attendance_level: Option<String>,
    #[serde(rename = "Predicted_Class", default)]
    pub predicted_class: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HourlyForecast {
    #[serde(rename = "Date", default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(rename = "Day_of_Week", default)]
    pub day_of_week: Option<i64>,
    #[serde(rename = "Hourly_Predictions", default)]
    pub hourly_predictions: Vec<HourlyPrediction>,
    #[serde(rename = "Is_Weekend", default)]
    pub is_weekend: Option<bool>,
    #[serde(rename = "Special_Event", default)]
    pub special_event: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Recommendation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeTimeRecommendation {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// The service has sent `Date` both as an ISO string and as a bare number.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// API client for the occupancy prediction service.
#[derive(Clone, Debug)]
pub struct PredictionClient {
    client: reqwest::Client,
    base_url: String,
    start_hour: u32,
    end_hour: u32,
}

impl PredictionClient {
    /// Create a new prediction client with configurable timeouts.
    pub fn new(base_url: String, network_config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            start_hour: 7,
            end_hour: 17,
        })
    }

    /// Set the hour window requested for hourly forecasts.
    pub fn with_hour_window(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.start_hour = start_hour;
        self.end_hour = end_hour;
        self
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        url.with_context(|| format!("Invalid prediction service URL for {}", path))
    }

    /// Fetch a JSON payload, treating an empty or `null` body as no data.
    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        tracing::debug!("Requesting {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to prediction service")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Prediction service returned error status: {}", status);
        }

        let body = response
            .text()
            .await
            .context("Failed to read prediction service response")?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).context("Failed to parse prediction service response")?;
        if value.is_null() {
            return Ok(None);
        }

        let data = serde_json::from_value(value)
            .context("Prediction service response has an unexpected shape")?;
        Ok(Some(data))
    }
}

impl PredictionSource for PredictionClient {
    async fn week(&self) -> Result<Option<Vec<PredictionRecord>>> {
        self.fetch(self.url("/predict_week", &[])?).await
    }

    async fn week_from(&self, date: NaiveDate) -> Result<Option<Vec<PredictionRecord>>> {
        let url = self.url(
            "/predict_week_from_date",
            &[("date", date.format("%Y-%m-%d").to_string())],
        )?;
        self.fetch(url).await
    }

    async fn day(&self) -> Result<Option<PredictionRecord>> {
        self.fetch(self.url("/predict", &[])?).await
    }

    async fn date(&self, date: NaiveDate) -> Result<Option<PredictionRecord>> {
        let url = self.url("/predict_date", &[("date", date.format("%Y-%m-%d").to_string())])?;
        self.fetch(url).await
    }

    async fn hourly(&self, date: Option<NaiveDate>) -> Result<Option<HourlyForecast>> {
        let mut params = Vec::with_capacity(3);
        if let Some(date) = date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        params.push(("start_hour", self.start_hour.to_string()));
        params.push(("end_hour", self.end_hour.to_string()));

        self.fetch(self.url("/predict_day", &params)?).await
    }

    async fn recommendations(&self) -> Result<Option<Vec<Recommendation>>> {
        self.fetch(self.url("/recommend", &[])?).await
    }

    async fn office_time_recommendations(&self) -> Result<Option<Vec<OfficeTimeRecommendation>>> {
        self.fetch(self.url("/recommend_office_times", &[])?).await
    }
}
