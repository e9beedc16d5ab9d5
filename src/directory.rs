//! Cached list of all users, loaded on demand.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::{api::OccupiClient, models::User};

#[derive(Debug, Default)]
struct Snapshot {
    users: Vec<User>,
    loaded: bool,
}

/// Shared user directory. Clones share the same cache.
#[derive(Clone, Debug)]
pub struct UserDirectory {
    client: OccupiClient,
    snapshot: Arc<RwLock<Snapshot>>,
}

impl UserDirectory {
    pub fn new(client: OccupiClient) -> Self {
        Self {
            client,
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
        }
    }

    /// Fetch the user list and replace the cache. A refused request leaves
    /// the previous snapshot in place. Returns the number of cached users.
    pub async fn refresh(&self, token: &str) -> Result<usize> {
        let response = self.client.users(token).await?;
        if !response.is_ok() {
            tracing::warn!("User list unavailable: {}", response.message());
            return Ok(self.snapshot.read().await.users.len());
        }

        let users = response.into_data().unwrap_or_default();
        let count = users.len();

        let mut snapshot = self.snapshot.write().await;
        snapshot.users = users;
        snapshot.loaded = true;

        tracing::debug!("User directory refreshed with {} users", count);
        Ok(count)
    }

    /// Current snapshot; empty before the first successful refresh.
    pub async fn get(&self) -> Vec<User> {
        self.snapshot.read().await.users.clone()
    }

    pub async fn find(&self, email: &str) -> Option<User> {
        self.snapshot
            .read()
            .await
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.loaded
    }
}
