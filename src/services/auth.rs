use anyhow::Result;

use super::{Outcome, Session};
use crate::{
    models::{EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, VerifyOtpRequest},
    store::{AppState, KeyValueStore},
};

impl<S: KeyValueStore> Session<S> {
    /// Sign in. Without a token in the reply the account needs an OTP first.
    pub async fn login(&self, email: &str, password: &str) -> Result<Outcome> {
        self.store.store_user_email(email)?;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .api
            .login(&request)
            .await
            .inspect_err(|e| tracing::error!("Login request failed: {:#}", e))?;

        if response.is_ok() {
            match response.data() {
                Some(data) => {
                    self.store.set_state(AppState::LoggedIn)?;
                    self.store.store_token(&data.token)?;
                    self.refresh_profile(email, &data.token).await;
                }
                None => self.store.set_state(AppState::VerifyOtpLogin)?,
            }
        }

        Ok(Outcome::from(&response))
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        employee_id: Option<&str>,
        push_token: Option<&str>,
    ) -> Result<Outcome> {
        self.store.store_user_email(email)?;

        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            employee_id: employee_id.map(str::to_string),
            push_token: push_token.map(str::to_string),
        };
        let response = self
            .api
            .register(&request)
            .await
            .inspect_err(|e| tracing::error!("Register request failed: {:#}", e))?;

        if response.is_ok() {
            self.store.set_state(AppState::VerifyOtpRegister)?;
        }

        Ok(Outcome::from(&response))
    }

    pub async fn verify_otp_register(&self, email: &str, otp: &str) -> Result<Outcome> {
        let response = self
            .api
            .verify_otp(&otp_request(email, otp))
            .await
            .inspect_err(|e| tracing::error!("OTP verification failed: {:#}", e))?;

        if response.is_ok() {
            if let Some(data) = response.data() {
                self.store.store_token(&data.token)?;
            }
        }

        Ok(Outcome::from(&response))
    }

    pub async fn verify_otp_login(&self, email: &str, otp: &str) -> Result<Outcome> {
        let response = self
            .api
            .verify_otp_login(&otp_request(email, otp))
            .await
            .inspect_err(|e| tracing::error!("OTP login failed: {:#}", e))?;

        if response.is_ok() {
            self.store.set_state(AppState::LoggedIn)?;
            if let Some(data) = response.data() {
                self.store.store_token(&data.token)?;
                self.refresh_profile(email, &data.token).await;
            }
        }

        Ok(Outcome::from(&response))
    }

    /// Check a password-reset OTP and keep it for [`Session::reset_password`].
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Outcome> {
        let response = self
            .api
            .verify_otp(&otp_request(email, otp))
            .await
            .inspect_err(|e| tracing::error!("OTP verification failed: {:#}", e))?;

        if response.is_ok() {
            self.store.store_otp(otp)?;
        }

        Ok(Outcome::from(&response))
    }

    /// Continue whichever OTP step the stored auth state says is pending.
    pub async fn continue_otp(&self, otp: &str) -> Result<Outcome> {
        let Some(email) = self.store.get_user_email()? else {
            return Ok(Outcome::unexpected());
        };

        match self.store.app_state()? {
            Some(AppState::VerifyOtpRegister) => self.verify_otp_register(&email, otp).await,
            Some(AppState::ResetPassword) => self.verify_otp(&email, otp).await,
            _ => self.verify_otp_login(&email, otp).await,
        }
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Outcome> {
        self.store.store_user_email(email)?;

        let request = EmailRequest {
            email: email.to_string(),
        };
        let response = self
            .api
            .forgot_password(&request)
            .await
            .inspect_err(|e| tracing::error!("Forgot password request failed: {:#}", e))?;

        if response.is_ok() {
            self.store.set_state(AppState::ResetPassword)?;
        }

        Ok(Outcome::from(&response))
    }

    /// Set a new password using the email and OTP kept from the reset flow.
    pub async fn reset_password(&self, new_password: &str, confirm: &str) -> Result<Outcome> {
        let (Some(email), Some(otp)) = (self.store.get_user_email()?, self.store.get_otp()?) else {
            return Ok(Outcome::unexpected());
        };

        let request = ResetPasswordRequest {
            email: email.clone(),
            otp,
            new_password: new_password.to_string(),
            new_password_confirm: confirm.to_string(),
        };
        let response = self
            .api
            .reset_password(&request)
            .await
            .inspect_err(|e| tracing::error!("Reset password request failed: {:#}", e))?;

        if response.is_ok() {
            self.store.set_state(AppState::LoggedIn)?;
            if let Some(data) = response.data() {
                self.store.store_token(&data.token)?;
                self.refresh_profile(&email, &data.token).await;
            }
        }

        Ok(Outcome::from(&response))
    }

    /// Sign out and wipe the session.
    pub async fn logout(&self) -> Result<Outcome> {
        let Some(token) = self.store.get_token()? else {
            return Ok(Outcome::unexpected());
        };

        let response = self
            .api
            .logout(&token)
            .await
            .inspect_err(|e| tracing::error!("Logout request failed: {:#}", e))?;

        if response.is_ok() {
            self.store.delete_all_data()?;
            self.store.set_state(AppState::LoggedOut)?;
        }

        Ok(Outcome::from(&response))
    }

    /// Pull profile and both settings groups after a sign-in. Failures are
    /// logged; the sign-in itself still stands.
    async fn refresh_profile(&self, email: &str, token: &str) {
        if let Err(e) = self.fetch_user_details(email, token).await {
            tracing::warn!("Could not refresh user details: {:#}", e);
        }
        if let Err(e) = self.fetch_notification_settings(email).await {
            tracing::warn!("Could not refresh notification settings: {:#}", e);
        }
        if let Err(e) = self.fetch_security_settings(email).await {
            tracing::warn!("Could not refresh security settings: {:#}", e);
        }
    }
}

fn otp_request(email: &str, otp: &str) -> VerifyOtpRequest {
    VerifyOtpRequest {
        email: email.to_string(),
        otp: otp.to_string(),
    }
}
