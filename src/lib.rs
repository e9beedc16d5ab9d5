//! Occupi Client Library
//!
//! Core of the Occupi office-occupancy client: prediction formatting, the
//! encrypted session store, the backend API client and the session services
//! built on top of them.

pub mod api;
pub mod config;
pub mod directory;
pub mod export;
pub mod models;
pub mod occupancy;
pub mod predictions;
pub mod services;
pub mod store;
pub mod traits;

// Re-export commonly used types
pub use api::{ApiResponse, OccupiClient, Success, Unsuccessful};
pub use config::AppConfig;
pub use directory::UserDirectory;
pub use occupancy::{
    DailySummary,
    ExtractedPrediction,
    SeriesPoint,
    // Pure transformations
    convert_hourly_values,
    convert_values,
    display_class,
    // Orchestrators
    formatted_daily_prediction_data,
    formatted_prediction_data,
    formatted_prediction_week_data,
    value_to_color,
    weekday_label,
};
pub use predictions::{PredictionClient, PredictionRecord};
pub use services::{Outcome, Session};
pub use store::{
    EncryptedFileStore, KdfParams, KeyValueStore, MemoryStore, SessionKey, SessionStore,
};
pub use traits::{Clock, MockClock, MockPredictionSource, PredictionSource, SystemClock};
