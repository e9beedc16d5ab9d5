use anyhow::Result;

use super::Session;
use crate::{
    models::{AnalyticsMetric, AnalyticsRange, AnalyticsSummary, DayStats},
    store::KeyValueStore,
};

impl<S: KeyValueStore> Session<S> {
    /// Summary of one metric for the signed-in user over `range`.
    ///
    /// `None` when signed out, when the API refuses, or when it returns no
    /// rows.
    pub async fn user_analytics(
        &self,
        metric: AnalyticsMetric,
        range: &AnalyticsRange,
    ) -> Result<Option<AnalyticsSummary>> {
        let Some((token, email)) = self.credentials()? else {
            tracing::warn!("No session; cannot fetch {}", metric.endpoint());
            return Ok(None);
        };

        let response = self.api.analytics(metric, &email, range, &token).await?;
        if !response.is_ok() {
            tracing::warn!("{} unavailable: {}", metric.endpoint(), response.message());
            return Ok(None);
        }
        Ok(response.into_data().and_then(|rows| rows.into_iter().next()))
    }

    pub async fn total_hours(&self, range: &AnalyticsRange) -> Result<Option<f64>> {
        Ok(self
            .user_analytics(AnalyticsMetric::Hours, range)
            .await?
            .and_then(|s| s.overall_total))
    }

    pub async fn average_hours(&self, range: &AnalyticsRange) -> Result<Option<f64>> {
        Ok(self
            .user_analytics(AnalyticsMetric::AverageHours, range)
            .await?
            .and_then(|s| s.overall_average))
    }

    pub async fn work_ratio(&self, range: &AnalyticsRange) -> Result<Option<f64>> {
        Ok(self
            .user_analytics(AnalyticsMetric::WorkRatio, range)
            .await?
            .and_then(|s| s.ratio))
    }

    /// Busiest office hours per weekday.
    pub async fn peak_office_hours(&self, range: &AnalyticsRange) -> Result<Vec<DayStats>> {
        Ok(self
            .user_analytics(AnalyticsMetric::PeakOfficeHours, range)
            .await?
            .map(|s| s.days)
            .unwrap_or_default())
    }

    /// Average arrival and departure times, when both are known.
    pub async fn arrival_departure(
        &self,
        range: &AnalyticsRange,
    ) -> Result<Option<(String, String)>> {
        Ok(self
            .user_analytics(AnalyticsMetric::ArrivalDeparture, range)
            .await?
            .and_then(|s| s.overall_avg_arrival.zip(s.overall_avg_departure)))
    }

    pub async fn in_office_rate(&self, range: &AnalyticsRange) -> Result<Option<f64>> {
        Ok(self
            .user_analytics(AnalyticsMetric::InOffice, range)
            .await?
            .and_then(|s| s.overall_rate))
    }
}
