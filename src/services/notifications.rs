use anyhow::Result;

use super::Session;
use crate::{models::Notification, store::KeyValueStore};

impl<S: KeyValueStore> Session<S> {
    /// Notifications addressed to the signed-in user.
    pub async fn user_notifications(&self) -> Result<Vec<Notification>> {
        let Some((token, email)) = self.credentials()? else {
            tracing::warn!("No session; cannot fetch notifications");
            return Ok(Vec::new());
        };

        let response = self.api.notifications(&email, &token).await?;
        if !response.is_ok() {
            tracing::warn!("Notifications unavailable: {}", response.message());
            return Ok(Vec::new());
        }
        Ok(response.into_data().unwrap_or_default())
    }
}

/// How many notifications `email` has not read yet.
pub fn unread_count(notifications: &[Notification], email: &str) -> usize {
    notifications
        .iter()
        .filter(|n| n.unread_emails.iter().any(|e| e == email))
        .count()
}
