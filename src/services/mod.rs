//! Session-level operations over the Occupi API.
//!
//! A [`Session`] pairs the HTTP client with the persistent session store.
//! Operations read credentials from the store, call the API and persist
//! whatever the response changes (token, profile, settings, auth state).

mod analytics;
mod auth;
mod bookings;
mod notifications;
mod presence;
mod user;

pub use bookings::split_bookings;
pub use notifications::unread_count;
pub use user::ProfileDetails;

use anyhow::Result;

use crate::{
    api::{ApiResponse, OccupiClient, UNEXPECTED_ERROR},
    store::{KeyValueStore, SessionStore},
};

/// Result of a user-facing operation: whether it worked and what to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Failure reported when session state needed for a call is missing.
    pub fn unexpected() -> Self {
        Self::failed(UNEXPECTED_ERROR)
    }
}

impl<T> From<&ApiResponse<T>> for Outcome {
    fn from(response: &ApiResponse<T>) -> Self {
        Self {
            success: response.is_ok(),
            message: response.message().to_string(),
        }
    }
}

pub struct Session<S> {
    api: OccupiClient,
    store: SessionStore<S>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(api: OccupiClient, store: SessionStore<S>) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &OccupiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Email of the signed-in user, preferring the cached profile.
    fn session_email(&self) -> Result<Option<String>> {
        if let Some(user) = self.store.user()? {
            if !user.email.is_empty() {
                return Ok(Some(user.email));
            }
        }
        Ok(self.store.get_user_email()?)
    }

    /// Token and email, or `None` if either is missing.
    fn credentials(&self) -> Result<Option<(String, String)>> {
        let token = self.store.get_token()?;
        let email = self.session_email()?;
        Ok(token.zip(email))
    }
}
