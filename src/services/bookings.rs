use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};

use super::{Outcome, Session};
use crate::{
    models::{BookRoomRequest, Booking, CancelBookingRequest, CheckInRequest, Room},
    store::KeyValueStore,
    traits::Clock,
};

impl<S: KeyValueStore> Session<S> {
    /// Bookings involving the signed-in user. Empty when signed out or when
    /// the API refuses the request.
    pub async fn user_bookings(&self) -> Result<Vec<Booking>> {
        let Some((token, email)) = self.credentials()? else {
            tracing::warn!("No session; cannot fetch bookings");
            return Ok(Vec::new());
        };

        let response = self.api.bookings(&email, &token).await?;
        if !response.is_ok() {
            tracing::warn!("Bookings unavailable: {}", response.message());
            return Ok(Vec::new());
        }
        Ok(response.into_data().unwrap_or_default())
    }

    pub async fn rooms(&self, floor_no: &str) -> Result<Vec<Room>> {
        let Some(token) = self.store.get_token()? else {
            tracing::warn!("No session token; cannot fetch rooms");
            return Ok(Vec::new());
        };

        let response = self.api.rooms(floor_no, &token).await?;
        if !response.is_ok() {
            tracing::warn!("Rooms unavailable: {}", response.message());
            return Ok(Vec::new());
        }
        Ok(response.into_data().unwrap_or_default())
    }

    pub async fn book_room(&self, request: &BookRoomRequest) -> Result<Outcome> {
        let Some(token) = self.store.get_token()? else {
            return Ok(Outcome::unexpected());
        };

        let response = self.api.book_room(request, &token).await?;
        Ok(Outcome::from(&response))
    }

    pub async fn cancel_booking(&self, booking: &Booking) -> Result<Outcome> {
        let Some(token) = self.store.get_token()? else {
            return Ok(Outcome::unexpected());
        };

        let response = self
            .api
            .cancel_booking(&CancelBookingRequest::from(booking), &token)
            .await?;
        Ok(Outcome::from(&response))
    }

    /// Remember the booking the user is looking at; check-in uses it.
    pub fn select_room(&self, booking: &Booking) -> Result<()> {
        let json = serde_json::to_string(booking).context("Failed to serialize booking")?;
        self.store.store_current_room(&json)?;
        Ok(())
    }

    /// Check in to the selected booking.
    pub async fn check_in(&self) -> Result<Outcome> {
        let (Some((token, email)), Some(booking)) =
            (self.credentials()?, self.store.current_room()?)
        else {
            return Ok(Outcome::unexpected());
        };

        let request = CheckInRequest {
            booking_id: booking.occupi_id,
            email,
        };
        let response = self.api.check_in(&request, &token).await?;
        if response.is_ok() {
            self.store.store_checked_in(true)?;
        }
        Ok(Outcome::from(&response))
    }
}

fn booking_date(booking: &Booking) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(&booking.date)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(&booking.date, "%Y-%m-%d"))
        .ok()
}

/// Split bookings into `(upcoming, past)` relative to today.
///
/// Bookings dated today are upcoming. Bookings with an unreadable date are
/// kept as upcoming so they stay visible.
pub fn split_bookings<C: Clock>(bookings: &[Booking], clock: &C) -> (Vec<Booking>, Vec<Booking>) {
    let today = clock.today();
    bookings
        .iter()
        .cloned()
        .partition(|booking| booking_date(booking).is_none_or(|date| date >= today))
}
