use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{models::Booking, occupancy::SeriesPoint, traits::Clock};

/// Flat CSV row for a booking; attendee emails are `;`-joined.
#[derive(Debug, Serialize)]
struct BookingRow<'a> {
    occupi_id: &'a str,
    room_id: &'a str,
    room_name: &'a str,
    floor_no: &'a str,
    creator: &'a str,
    emails: String,
    date: &'a str,
    start: &'a str,
    end: &'a str,
    checked_in: bool,
}

impl<'a> From<&'a Booking> for BookingRow<'a> {
    fn from(booking: &'a Booking) -> Self {
        Self {
            occupi_id: &booking.occupi_id,
            room_id: &booking.room_id,
            room_name: &booking.room_name,
            floor_no: &booking.floor_no,
            creator: &booking.creator,
            emails: booking.emails.join(";"),
            date: &booking.date,
            start: &booking.start,
            end: &booking.end,
            checked_in: booking.checked_in,
        }
    }
}

#[derive(Debug, Serialize)]
struct ForecastRow {
    label: Option<String>,
    value: Option<f64>,
}

fn export_path<C: Clock>(output_dir: &Path, kind: &str, clock: &C) -> PathBuf {
    let filename = format!(
        "occupi_{}_{}.csv",
        kind,
        clock.now_utc().format("%Y%m%d_%H%M%S")
    );
    output_dir.join(filename)
}

/// Write bookings to a timestamped CSV file in `output_dir`.
pub async fn export_bookings_csv<C: Clock>(
    bookings: &[Booking],
    output_dir: &Path,
    clock: &C,
) -> Result<PathBuf> {
    let output_path = export_path(output_dir, "bookings", clock);

    let path = output_path.clone();
    let bookings = bookings.to_vec();
    let count = bookings.len();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut wtr = csv::Writer::from_path(&path).context("Failed to create CSV writer")?;

        for booking in &bookings {
            wtr.serialize(BookingRow::from(booking))
                .context("Failed to serialize booking")?;
        }

        wtr.flush().context("Failed to flush CSV writer")?;
        Ok(())
    })
    .await
    .context("CSV export task failed")??;

    tracing::info!("Exported {} bookings to {}", count, output_path.display());
    Ok(output_path)
}

/// Write a forecast series to a timestamped CSV file.
pub async fn export_forecast_csv<C: Clock>(
    points: &[SeriesPoint],
    output_dir: &Path,
    clock: &C,
) -> Result<PathBuf> {
    let output_path = export_path(output_dir, "forecast", clock);

    let path = output_path.clone();
    let points = points.to_vec();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut wtr = csv::Writer::from_path(&path).context("Failed to create CSV writer")?;

        for point in points {
            wtr.serialize(ForecastRow {
                label: point.label,
                value: point.value,
            })
            .context("Failed to serialize forecast point")?;
        }

        wtr.flush().context("Failed to flush CSV writer")?;
        Ok(())
    })
    .await
    .context("CSV export task failed")??;

    Ok(output_path)
}
