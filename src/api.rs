use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    config::NetworkConfig,
    models::{
        AnalyticsMetric, AnalyticsRange, AnalyticsSummary, BookRoomRequest, Booking,
        CancelBookingRequest, ChangePasswordRequest, CheckInRequest, EmailRequest, LoginRequest,
        Notification, NotificationSettings, RegisterRequest, ResetPasswordRequest, Room,
        SecuritySettings, UpdateDetailsRequest, UpdateNotificationsRequest, UpdateSecurityRequest,
        User, VerifyOtpRequest,
    },
};

/// Message used when the backend gives no usable error envelope, or when a
/// call cannot be made because session state is missing.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

// ==================== Response Envelopes ====================

/// Body of a 2xx response. `status` is always the HTTP status code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Success<T> {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, PartialEq, Deserialize, Error)]
#[error("request failed with status {status}: {message}")]
pub struct Unsuccessful {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

impl Unsuccessful {
    pub fn unexpected(status: u16) -> Self {
        Self {
            status,
            message: UNEXPECTED_ERROR.to_string(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success(Success<T>),
    Unsuccessful(Unsuccessful),
}

impl<T> ApiResponse<T> {
    pub fn status(&self) -> u16 {
        match self {
            ApiResponse::Success(s) => s.status,
            ApiResponse::Unsuccessful(u) => u.status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiResponse::Success(s) => &s.message,
            ApiResponse::Unsuccessful(u) => &u.message,
        }
    }

    /// Only a 200 counts as success for the session flows.
    pub fn is_ok(&self) -> bool {
        self.status() == StatusCode::OK.as_u16()
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Success(s) => s.data.as_ref(),
            ApiResponse::Unsuccessful(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ApiResponse::Success(s) => s.data,
            ApiResponse::Unsuccessful(_) => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<Success<T>, Unsuccessful> {
        match self {
            ApiResponse::Success(s) => Ok(s),
            ApiResponse::Unsuccessful(u) => Err(u),
        }
    }
}

/// `data` payload of the login and OTP verification endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenData {
    pub token: String,
}

#[derive(Debug, Serialize)]
struct EmailFilter<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct FloorFilter<'a> {
    #[serde(rename = "floorNo")]
    floor_no: &'a str,
}

// ==================== OccupiClient ====================

/// API client for the Occupi backend.
#[derive(Clone, Debug)]
pub struct OccupiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OccupiClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(base_url: String, network_config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        url.with_context(|| format!("Invalid API URL for {}", path))
    }

    fn get(&self, url: Url, token: Option<&str>) -> RequestBuilder {
        self.authorize(self.client.get(url), token)
    }

    fn post<B: Serialize + ?Sized>(&self, url: Url, token: Option<&str>, body: &B) -> RequestBuilder {
        self.authorize(self.client.post(url), token).json(body)
    }

    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match token {
            Some(token) => request.header("Authorization", token),
            None => request,
        }
    }

    /// Send a request and sort the reply into a success or error envelope.
    ///
    /// Transport failures and undecodable 2xx bodies are errors; any non-2xx
    /// reply is an `Unsuccessful` value.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request
            .send()
            .await
            .context("Failed to send request to Occupi API")?;

        let status = response.status();
        let url = response.url().path().to_string();
        let body = response
            .text()
            .await
            .context("Failed to read Occupi API response")?;

        if status.is_success() {
            let mut success: Success<T> = if body.trim().is_empty() {
                Success {
                    status: 0,
                    message: String::new(),
                    data: None,
                    meta: None,
                }
            } else {
                serde_json::from_str(&body)
                    .with_context(|| format!("Failed to parse response from {}", url))?
            };
            success.status = status.as_u16();
            tracing::debug!("{} -> {}", url, status);
            return Ok(ApiResponse::Success(success));
        }

        let unsuccessful = match serde_json::from_str::<Unsuccessful>(&body) {
            Ok(mut envelope) if !envelope.message.is_empty() => {
                envelope.status = status.as_u16();
                envelope
            }
            _ => Unsuccessful::unexpected(status.as_u16()),
        };
        tracing::warn!("{} -> {}: {}", url, status, unsuccessful.message);
        Ok(ApiResponse::Unsuccessful(unsuccessful))
    }

    // --- Auth ---

    pub async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<TokenData>> {
        let url = self.url("/auth/login-mobile", &[])?;
        self.send(self.post(url, None, request)).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/auth/register", &[])?;
        self.send(self.post(url, None, request)).await
    }

    /// OTP check shared by registration and password reset.
    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<ApiResponse<TokenData>> {
        let url = self.url("/auth/verify-otp", &[])?;
        self.send(self.post(url, None, request)).await
    }

    pub async fn verify_otp_login(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<ApiResponse<TokenData>> {
        let url = self.url("/auth/verify-otp-mobile-login", &[])?;
        self.send(self.post(url, None, request)).await
    }

    pub async fn forgot_password(
        &self,
        request: &EmailRequest,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/auth/forgot-password", &[])?;
        self.send(self.post(url, None, request)).await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<ApiResponse<TokenData>> {
        let url = self.url("/auth/reset-password", &[])?;
        self.send(self.post(url, None, request)).await
    }

    pub async fn logout(&self, token: &str) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/auth/logout", &[])?;
        self.send(self.post(url, Some(token), &serde_json::json!({}))).await
    }

    // --- Users ---

    pub async fn user_details(&self, email: &str, token: &str) -> Result<ApiResponse<User>> {
        let url = self.url("/api/user-details", &[("email", email.to_string())])?;
        self.send(self.get(url, Some(token))).await
    }

    pub async fn update_user(
        &self,
        request: &UpdateDetailsRequest,
        token: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/api/update-user", &[])?;
        self.send(self.post(url, Some(token), request)).await
    }

    pub async fn users(&self, token: &str) -> Result<ApiResponse<Vec<User>>> {
        let url = self.url("/api/get-users", &[])?;
        self.send(self.get(url, Some(token))).await
    }

    // --- Rooms & bookings ---

    pub async fn rooms(&self, floor_no: &str, token: &str) -> Result<ApiResponse<Vec<Room>>> {
        let filter = serde_json::to_string(&FloorFilter { floor_no })?;
        let url = self.url("/api/view-rooms", &[("filter", filter)])?;
        self.send(self.get(url, Some(token))).await
    }

    pub async fn book_room(
        &self,
        request: &BookRoomRequest,
        token: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/api/book-room", &[])?;
        self.send(self.post(url, Some(token), request)).await
    }

    pub async fn bookings(&self, email: &str, token: &str) -> Result<ApiResponse<Vec<Booking>>> {
        let filter = serde_json::to_string(&EmailFilter { email })?;
        let url = self.url("/api/view-bookings", &[("filter", filter)])?;
        self.send(self.get(url, Some(token))).await
    }

    pub async fn cancel_booking(
        &self,
        request: &CancelBookingRequest,
        token: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/api/cancel-booking", &[])?;
        self.send(self.post(url, Some(token), request)).await
    }

    pub async fn check_in(
        &self,
        request: &CheckInRequest,
        token: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/api/check-in", &[])?;
        self.send(self.post(url, Some(token), request)).await
    }

    // --- Notifications & settings ---

    pub async fn notifications(
        &self,
        email: &str,
        token: &str,
    ) -> Result<ApiResponse<Vec<Notification>>> {
        let filter = serde_json::json!({ "emails": [email] }).to_string();
        let url = self.url("/api/get-notifications", &[("filter", filter)])?;
        self.send(self.get(url, Some(token))).await
    }

    pub async fn notification_settings(
        &self,
        email: &str,
        token: &str,
    ) -> Result<ApiResponse<NotificationSettings>> {
        let url = self.url("/api/get-notification-settings", &[("email", email.to_string())])?;
        self.send(self.get(url, Some(token))).await
    }

    pub async fn update_notification_settings(
        &self,
        request: &UpdateNotificationsRequest,
        token: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/api/update-notification-settings", &[])?;
        self.send(self.post(url, Some(token), request)).await
    }

    pub async fn security_settings(
        &self,
        email: &str,
        token: &str,
    ) -> Result<ApiResponse<SecuritySettings>> {
        let url = self.url("/api/get-security-settings", &[("email", email.to_string())])?;
        self.send(self.get(url, Some(token))).await
    }

    pub async fn update_security_settings(
        &self,
        request: &UpdateSecurityRequest,
        token: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/api/update-security-settings", &[])?;
        self.send(self.post(url, Some(token), request)).await
    }

    /// Password changes go through the security settings endpoint.
    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
        token: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/api/update-security-settings", &[])?;
        self.send(self.post(url, Some(token), request)).await
    }

    // --- Analytics & presence ---

    pub async fn analytics(
        &self,
        metric: AnalyticsMetric,
        email: &str,
        range: &AnalyticsRange,
        token: &str,
    ) -> Result<ApiResponse<Vec<AnalyticsSummary>>> {
        let path = format!("/analytics/{}", metric.endpoint());
        let params = [
            ("email", email.to_string()),
            ("timeFrom", range.time_from.clone()),
            ("timeTo", range.time_to.clone()),
        ];
        let url = self.url(&path, &params)?;
        self.send(self.get(url, Some(token))).await
    }

    /// Report that the user has arrived at the office.
    pub async fn enter_office(&self, token: &str) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/rtc/enter", &[])?;
        self.send(self.get(url, Some(token))).await
    }

    pub async fn exit_office(&self, token: &str) -> Result<ApiResponse<serde_json::Value>> {
        let url = self.url("/rtc/exit", &[])?;
        self.send(self.get(url, Some(token))).await
    }
}
