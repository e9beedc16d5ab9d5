use anyhow::{Context, Result};

use super::{Outcome, Session};
use crate::{
    models::{
        ChangePasswordRequest, NotificationSettings, SecuritySettings, Toggle,
        UpdateDetailsRequest, UpdateNotificationsRequest, UpdateSecurityRequest, User,
    },
    store::{AppState, KeyValueStore},
};

/// Profile fields the user can edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDetails {
    pub name: Option<String>,
    /// `YYYY-MM-DD`; sent to the API as midnight UTC.
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub number: Option<String>,
    pub pronouns: Option<String>,
}

fn dob_timestamp(dob: &str) -> String {
    if dob.contains('T') {
        dob.to_string()
    } else {
        format!("{}T00:00:00.000Z", dob)
    }
}

impl<S: KeyValueStore> Session<S> {
    /// Fetch the profile and cache it as `UserData`.
    pub async fn fetch_user_details(&self, email: &str, token: &str) -> Result<Option<User>> {
        let response = self.api.user_details(email, token).await?;
        if !response.is_ok() {
            tracing::warn!("User details unavailable: {}", response.message());
            return Ok(None);
        }

        let user = response.into_data();
        if let Some(user) = &user {
            let json = serde_json::to_string(user).context("Failed to serialize user details")?;
            self.store.store_user_data(&json)?;
        }
        Ok(user)
    }

    pub async fn fetch_notification_settings(
        &self,
        email: &str,
    ) -> Result<Option<NotificationSettings>> {
        let Some(token) = self.store.get_token()? else {
            tracing::warn!("No session token; skipping notification settings");
            return Ok(None);
        };

        let response = self.api.notification_settings(email, &token).await?;
        if !response.is_ok() {
            tracing::warn!("Notification settings unavailable: {}", response.message());
            return Ok(None);
        }

        let settings = response.into_data();
        if let Some(settings) = &settings {
            self.store
                .store_notification_settings(&serde_json::to_string(settings)?)?;
        }
        Ok(settings)
    }

    pub async fn fetch_security_settings(&self, email: &str) -> Result<Option<SecuritySettings>> {
        let Some(token) = self.store.get_token()? else {
            tracing::warn!("No session token; skipping security settings");
            return Ok(None);
        };

        let response = self.api.security_settings(email, &token).await?;
        if !response.is_ok() {
            tracing::warn!("Security settings unavailable: {}", response.message());
            return Ok(None);
        }

        let settings = response.into_data();
        if let Some(settings) = &settings {
            self.store
                .store_security_settings(&serde_json::to_string(settings)?)?;
        }
        Ok(settings)
    }

    pub async fn update_security_settings(
        &self,
        mfa: Toggle,
        force_logout: Toggle,
    ) -> Result<Outcome> {
        let Some((token, email)) = self.credentials()? else {
            return Ok(Outcome::unexpected());
        };

        let request = UpdateSecurityRequest {
            email,
            mfa,
            force_logout,
        };
        let response = self.api.update_security_settings(&request, &token).await?;
        if !response.is_ok() {
            return Ok(Outcome::from(&response));
        }

        let settings = SecuritySettings { mfa, force_logout };
        self.store
            .store_security_settings(&serde_json::to_string(&settings)?)?;
        Ok(Outcome::ok("Settings updated successfully"))
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<Outcome> {
        let Some((token, email)) = self.credentials()? else {
            return Ok(Outcome::unexpected());
        };

        let request = ChangePasswordRequest {
            email,
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
            new_password_confirm: confirm.to_string(),
        };
        let response = self.api.change_password(&request, &token).await?;
        if !response.is_ok() {
            return Ok(Outcome::from(&response));
        }
        Ok(Outcome::ok("Password updated successfully"))
    }

    /// Update profile details. Completing details right after registration
    /// ends the sign-up flow, so the user is sent back to sign in.
    pub async fn update_details(&self, details: ProfileDetails) -> Result<Outcome> {
        let Some((token, email)) = self.credentials()? else {
            return Ok(Outcome::unexpected());
        };

        let request = UpdateDetailsRequest {
            session_email: email,
            name: details.name,
            dob: details.dob.as_deref().map(dob_timestamp),
            gender: details.gender,
            number: details.number,
            pronouns: details.pronouns,
        };
        let response = self.api.update_user(&request, &token).await?;
        if !response.is_ok() {
            return Ok(Outcome::from(&response));
        }

        if self.store.app_state()? == Some(AppState::VerifyOtpRegister) {
            self.store.set_state(AppState::LoggedOut)?;
        }
        Ok(Outcome::ok("Details updated successfully"))
    }

    pub async fn update_notification_settings(
        &self,
        invites: Toggle,
        booking_reminder: Toggle,
    ) -> Result<Outcome> {
        let Some((token, email)) = self.credentials()? else {
            return Ok(Outcome::unexpected());
        };

        let request = UpdateNotificationsRequest {
            email,
            invites,
            booking_reminder,
        };
        let response = self
            .api
            .update_notification_settings(&request, &token)
            .await?;
        if !response.is_ok() {
            return Ok(Outcome::from(&response));
        }

        let settings = NotificationSettings {
            invites,
            booking_reminder,
        };
        self.store
            .store_notification_settings(&serde_json::to_string(&settings)?)?;
        Ok(Outcome::ok("Settings updated successfully"))
    }

    /// Display name from the cached profile.
    pub fn username(&self) -> Result<Option<String>> {
        Ok(self.store.user()?.and_then(|user| user.name))
    }
}
