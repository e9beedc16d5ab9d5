//! Typed shapes exchanged with the Occupi API.
//!
//! Field names follow the API's JSON (mostly camelCase); request bodies are
//! separate structs from the records the API returns.

use serde::{Deserialize, Serialize};

// ==================== Records ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    #[serde(default)]
    pub room_no: String,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub floor_no: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_occupancy: Option<serde_json::Value>,
    #[serde(default)]
    pub max_occupancy: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub occupi_id: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub floor_no: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub emails: Vec<String>,
    /// Booking date as sent by the API (RFC 3339 or `YYYY-MM-DD`).
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub checked_in: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub employeeid: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "send_time")]
    pub send_time: String,
    #[serde(default)]
    pub unread_emails: Vec<String>,
}

// ==================== Settings ====================

/// On/off flag as the API spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    On,
    #[default]
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        if value { Toggle::On } else { Toggle::Off }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default)]
    pub invites: Toggle,
    #[serde(default)]
    pub booking_reminder: Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    #[serde(default)]
    pub mfa: Toggle,
    /// Older sessions persisted this field as `forcelogout`.
    #[serde(default, alias = "forcelogout")]
    pub force_logout: Toggle,
}

// ==================== Analytics ====================

/// Per-user statistics the analytics service can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMetric {
    Hours,
    AverageHours,
    WorkRatio,
    PeakOfficeHours,
    ArrivalDeparture,
    InOffice,
}

impl AnalyticsMetric {
    pub const ALL: [AnalyticsMetric; 6] = [
        AnalyticsMetric::Hours,
        AnalyticsMetric::AverageHours,
        AnalyticsMetric::WorkRatio,
        AnalyticsMetric::PeakOfficeHours,
        AnalyticsMetric::ArrivalDeparture,
        AnalyticsMetric::InOffice,
    ];

    /// Path segment under `/analytics/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            AnalyticsMetric::Hours => "user-hours",
            AnalyticsMetric::AverageHours => "user-average-hours",
            AnalyticsMetric::WorkRatio => "user-work-ratio",
            AnalyticsMetric::PeakOfficeHours => "user-peak-office-hours",
            AnalyticsMetric::ArrivalDeparture => "user-arrival-departure-average",
            AnalyticsMetric::InOffice => "user-in-office",
        }
    }
}

/// Per-weekday breakdown inside an analytics summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    #[serde(default)]
    pub weekday: Option<String>,
    #[serde(default)]
    pub ratio: Option<f64>,
    #[serde(default)]
    pub avg_arrival: Option<String>,
    #[serde(default)]
    pub avg_departure: Option<String>,
    #[serde(default)]
    pub hours: Vec<f64>,
}

/// First element of an analytics response. Each metric fills a different
/// subset of the fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    #[serde(default)]
    pub overall_total: Option<f64>,
    #[serde(default)]
    pub overall_average: Option<f64>,
    #[serde(default)]
    pub ratio: Option<f64>,
    #[serde(default)]
    pub overall_weekday_count: Option<f64>,
    #[serde(default, rename = "overallavgArrival")]
    pub overall_avg_arrival: Option<String>,
    #[serde(default, rename = "overallavgDeparture")]
    pub overall_avg_departure: Option<String>,
    #[serde(default)]
    pub overall_rate: Option<f64>,
    #[serde(default)]
    pub days: Vec<DayStats>,
}

// ==================== Requests ====================

/// Query window for the analytics endpoints, as RFC 3339 timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRange {
    pub time_from: String,
    pub time_to: String,
}

impl AnalyticsRange {
    /// Whole days from `from` 00:00 UTC through `to` 23:59:59.999 UTC.
    pub fn days(from: chrono::NaiveDate, to: chrono::NaiveDate) -> Self {
        Self {
            time_from: format!("{}T00:00:00.000Z", from.format("%Y-%m-%d")),
            time_to: format!("{}T23:59:59.999Z", to.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(rename = "expoPushToken", skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRoomRequest {
    pub room_id: String,
    pub room_name: String,
    pub emails: Vec<String>,
    pub creator: String,
    pub floor_no: String,
    pub date: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    pub booking_id: String,
    pub room_id: String,
    pub emails: Vec<String>,
    pub creator: String,
    pub floor_no: String,
    pub date: String,
    pub start: String,
    pub end: String,
}

impl From<&Booking> for CancelBookingRequest {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.occupi_id.clone(),
            room_id: booking.room_id.clone(),
            emails: booking.emails.clone(),
            creator: booking.creator.clone(),
            floor_no: booking.floor_no.clone(),
            date: booking.date.clone(),
            start: booking.start.clone(),
            end: booking.end.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub booking_id: String,
    pub email: String,
}

/// Profile fields a user may change; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateDetailsRequest {
    pub session_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSecurityRequest {
    pub email: String,
    pub mfa: Toggle,
    pub force_logout: Toggle,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationsRequest {
    pub email: String,
    pub invites: Toggle,
    pub booking_reminder: Toggle,
}
