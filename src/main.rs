use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use clap::{Parser, Subcommand};
use occupi_client::{
    api::OccupiClient,
    config::AppConfig,
    directory::UserDirectory,
    export,
    models::AnalyticsRange,
    occupancy,
    predictions::PredictionClient,
    services::{Outcome, Session, split_bookings, unread_count},
    store::{EncryptedFileStore, KeyValueStore, MemoryStore, SessionStore},
    traits::{Clock, SystemClock},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "occupi")]
#[command(about = "Office occupancy forecasts and bookings from the terminal")]
struct Args {
    /// Keep the session in memory only (nothing is written to disk)
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Occupancy forecasts
    Predict {
        #[command(subcommand)]
        what: Predict,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Submit the one-time pin for the pending sign-in, sign-up or reset
    VerifyOtp {
        #[arg(long)]
        otp: String,
    },
    /// Sign out and clear the local session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Also look the user up in the directory
        #[arg(long)]
        directory: bool,
    },
    /// List bookings, optionally exporting them to CSV
    Bookings {
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Check in to a booking
    CheckIn {
        /// Booking ID to select before checking in
        #[arg(long)]
        booking: Option<String>,
    },
    /// List notifications
    Notifications,
    /// Personal office statistics (defaults to the last seven days)
    Stats {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Report arriving at or leaving the office
    Office {
        #[command(subcommand)]
        action: Office,
    },
}

#[derive(Subcommand, Debug)]
enum Office {
    /// Arrived at the office
    Enter,
    /// Left the office
    Exit,
}

#[derive(Subcommand, Debug)]
enum Predict {
    /// Weekly forecast
    Week {
        /// First day of the week (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Show Monday-Friday as calibrated bar heights
        #[arg(long)]
        bars: bool,
        /// Write the series to a CSV file in this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Today's forecast
    Day,
    /// Hour-by-hour forecast
    Hourly {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Show head-count midpoints instead of classes
        #[arg(long)]
        midpoints: bool,
    },
    /// Recommended office days and times
    Recommend,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy("occupi_client=debug");

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let command = match args.command {
            Command::Predict { what } => return run_predict(what, &config).await,
            command => command,
        };

        let api = OccupiClient::new(config.api.base_url.clone(), &config.network)?;

        if args.ephemeral {
            let session = Session::new(api, SessionStore::new(MemoryStore::new()));
            return run_session(command, &session).await;
        }

        let secret = config
            .store
            .secret
            .as_deref()
            .context("No store secret configured; set OCCUPI__STORE__SECRET or use --ephemeral")?;
        let path = config.store.resolved_path();
        let backend = EncryptedFileStore::open(&path, secret)
            .with_context(|| format!("Failed to open session store at {}", path.display()))?;

        let session = Session::new(api, SessionStore::new(backend));
        run_session(command, &session).await
    })
}

async fn run_predict(what: Predict, config: &AppConfig) -> Result<()> {
    let settings = &config.predictions;
    let source = PredictionClient::new(settings.base_url.clone(), &config.network)?
        .with_hour_window(settings.hourly_start_hour, settings.hourly_end_hour);

    match what {
        Predict::Week { date, bars, export } => {
            let series = match date {
                Some(date) => occupancy::formatted_prediction_week_data(&source, date).await,
                None => occupancy::formatted_prediction_data(&source).await,
            };
            if series.is_empty() {
                println!("No forecast available");
                return Ok(());
            }

            let shown = if bars {
                occupancy::convert_values(&series, settings.weekday_scale_factor)
            } else {
                series.clone()
            };
            for (point, raw) in shown.iter().zip(&series) {
                let colour = raw
                    .value
                    .map(occupancy::value_to_color)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<4} {:>8} {}",
                    point.label.as_deref().unwrap_or("?"),
                    format_value(point.value),
                    colour
                );
            }

            if let Some(dir) = export {
                let path = export::export_forecast_csv(&shown, &dir, &SystemClock).await?;
                println!("Exported to {}", path.display());
            }
        }
        Predict::Day => match occupancy::formatted_daily_prediction_data(&source).await {
            Some(summary) => println!(
                "{} ({}): class {} attendance {}",
                summary.date.as_deref().unwrap_or("?"),
                summary.day.as_deref().unwrap_or("?"),
                summary.class.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()),
                summary.attendance.as_deref().unwrap_or("?")
            ),
            None => println!("No forecast available"),
        },
        Predict::Hourly { date, midpoints } => {
            let series = if midpoints {
                occupancy::hourly_attendance_midpoints(&source, date, &settings.focus_hours).await
            } else {
                occupancy::hourly_classes(&source, date, &settings.focus_hours).await
            };
            if series.is_empty() {
                println!("No forecast available");
            }
            for point in series {
                println!(
                    "{:>6} {:>8}",
                    point.label.as_deref().unwrap_or("?"),
                    format_value(point.value)
                );
            }
        }
        Predict::Recommend => {
            for rec in occupancy::formatted_recommendations(&source).await {
                println!(
                    "* {}: {}",
                    rec.title.as_deref().unwrap_or(""),
                    rec.description.as_deref().unwrap_or("")
                );
            }
            for time in occupancy::formatted_office_time_recommendations(&source).await {
                println!(
                    "  {} {}-{}",
                    time.day.as_deref().unwrap_or("?"),
                    time.start_time.as_deref().unwrap_or("?"),
                    time.end_time.as_deref().unwrap_or("?")
                );
            }
        }
    }

    Ok(())
}

async fn run_session<S: KeyValueStore>(command: Command, session: &Session<S>) -> Result<()> {
    match command {
        Command::Predict { .. } => anyhow::bail!("Forecasts do not need a session"),
        Command::Login { email, password } => report(session.login(&email, &password).await?),
        Command::VerifyOtp { otp } => report(session.continue_otp(&otp).await?),
        Command::Logout => report(session.logout().await?),
        Command::Whoami { directory } => {
            let Some(user) = session.store().user()? else {
                println!("Not signed in");
                return Ok(());
            };
            println!("{} <{}>", user.name.as_deref().unwrap_or("(no name)"), user.email);

            if directory {
                let Some(token) = session.store().get_token()? else {
                    return Ok(());
                };
                let users = UserDirectory::new(session.api().clone());
                users.refresh(&token).await?;
                match users.find(&user.email).await {
                    Some(entry) => println!(
                        "Directory: employee {}",
                        entry.employeeid.as_deref().unwrap_or("?")
                    ),
                    None => println!("Directory: not listed"),
                }
            }
        }
        Command::Bookings { export } => {
            let bookings = session.user_bookings().await?;
            let (upcoming, past) = split_bookings(&bookings, &SystemClock);
            println!("Upcoming:");
            for booking in &upcoming {
                println!(
                    "  {} {} {} {}-{}",
                    booking.occupi_id, booking.room_name, booking.date, booking.start, booking.end
                );
            }
            println!("Past: {}", past.len());

            if let Some(dir) = export {
                let path = export::export_bookings_csv(&bookings, &dir, &SystemClock).await?;
                println!("Exported to {}", path.display());
            }
        }
        Command::CheckIn { booking } => {
            if let Some(id) = booking {
                let bookings = session.user_bookings().await?;
                let selected = bookings
                    .iter()
                    .find(|b| b.occupi_id == id)
                    .with_context(|| format!("No booking with ID {}", id))?;
                session.select_room(selected)?;
            }
            report(session.check_in().await?);
        }
        Command::Notifications => {
            let notifications = session.user_notifications().await?;
            let email = session.store().get_user_email()?.unwrap_or_default();
            println!("{} unread", unread_count(&notifications, &email));
            for notification in notifications {
                println!("  {}: {}", notification.title, notification.message);
            }
        }
        Command::Stats { from, to } => {
            let to = to.unwrap_or_else(|| SystemClock.today());
            let from = from.unwrap_or(to - Days::new(6));
            let range = AnalyticsRange::days(from, to);

            println!("{} to {}", from, to);
            println!("  Total hours:   {}", format_value(session.total_hours(&range).await?));
            println!("  Average hours: {}", format_value(session.average_hours(&range).await?));
            println!("  Work ratio:    {}", format_value(session.work_ratio(&range).await?));
            println!("  In office:     {}", format_value(session.in_office_rate(&range).await?));
            match session.arrival_departure(&range).await? {
                Some((arrival, departure)) => {
                    println!("  Arrival {} / departure {}", arrival, departure)
                }
                None => println!("  Arrival / departure: -"),
            }
            for day in session.peak_office_hours(&range).await? {
                let hours: Vec<_> = day.hours.iter().map(|h| h.to_string()).collect();
                println!(
                    "  {:<10} {}",
                    day.weekday.as_deref().unwrap_or("?"),
                    hours.join(", ")
                );
            }
        }
        Command::Office { action } => match action {
            Office::Enter => report(session.enter_office().await?),
            Office::Exit => report(session.exit_office().await?),
        },
    }

    Ok(())
}

fn report(outcome: Outcome) {
    if outcome.success {
        println!("{}", outcome.message);
    } else {
        eprintln!("Failed: {}", outcome.message);
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
