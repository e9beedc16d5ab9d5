use anyhow::Result;

use super::{Outcome, Session};
use crate::store::KeyValueStore;

impl<S: KeyValueStore> Session<S> {
    /// Tell the live occupancy counter the user has entered the office.
    pub async fn enter_office(&self) -> Result<Outcome> {
        let Some(token) = self.store.get_token()? else {
            return Ok(Outcome::unexpected());
        };

        let response = self.api.enter_office(&token).await?;
        tracing::info!("Office entry reported: {}", response.message());
        Ok(Outcome::from(&response))
    }

    pub async fn exit_office(&self) -> Result<Outcome> {
        let Some(token) = self.store.get_token()? else {
            return Ok(Outcome::unexpected());
        };

        let response = self.api.exit_office(&token).await?;
        tracing::info!("Office exit reported: {}", response.message());
        Ok(Outcome::from(&response))
    }
}
