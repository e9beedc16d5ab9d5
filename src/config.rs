use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub predictions: PredictionsConfig,
    pub network: NetworkConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dev.occupi.tech".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictionsConfig {
    pub base_url: String,
    /// Base bar height used when scaling weekday severity classes for charts.
    pub weekday_scale_factor: f64,
    pub hourly_start_hour: u32,
    pub hourly_end_hour: u32,
    /// Hours shown on the hourly charts.
    pub focus_hours: Vec<u32>,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai.occupi.tech".to_string(),
            weekday_scale_factor: 150.0,
            hourly_start_hour: 7,
            hourly_end_hour: 17,
            focus_hours: vec![7, 9, 11, 12, 13, 15, 17],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Location of the encrypted session file. Falls back to the user data dir.
    pub path: Option<PathBuf>,
    /// Secret the session file is sealed with.
    pub secret: Option<String>,
}

impl StoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("occupi")
                .join("session.json")
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("occupi");

        let defaults = PredictionsConfig::default();

        let builder = Config::builder()
            // 1. Default values
            .set_default("api.base_url", ApiConfig::default().base_url)?
            .set_default("predictions.base_url", defaults.base_url)?
            .set_default("predictions.weekday_scale_factor", defaults.weekday_scale_factor)?
            .set_default("predictions.hourly_start_hour", i64::from(defaults.hourly_start_hour))?
            .set_default("predictions.hourly_end_hour", i64::from(defaults.hourly_end_hour))?
            .set_default(
                "predictions.focus_hours",
                defaults.focus_hours.iter().map(|h| i64::from(*h)).collect::<Vec<_>>(),
            )?
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            .set_default("store.path", None::<String>)?
            .set_default("store.secret", None::<String>)?

            // 2. Local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. User config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Environment variables (OCCUPI__STORE__SECRET=...)
            .add_source(
                Environment::with_prefix("OCCUPI")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("predictions.focus_hours")
                    .try_parsing(true),
            );

        let s = builder.build().context("Failed to build configuration")?;
        Ok(s.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default Value Tests ====================

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "https://dev.occupi.tech");
    }

    #[test]
    fn test_predictions_config_defaults() {
        let config = PredictionsConfig::default();
        assert_eq!(config.base_url, "https://ai.occupi.tech");
        assert_eq!(config.weekday_scale_factor, 150.0);
        assert_eq!(config.hourly_start_hour, 7);
        assert_eq!(config.hourly_end_hour, 17);
        assert_eq!(config.focus_hours, vec![7, 9, 11, 12, 13, 15, 17]);
    }

    #[test]
    fn test_network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert!(config.path.is_none());
        assert!(config.secret.is_none());
        assert!(config.resolved_path().ends_with("occupi/session.json"));
    }

    #[test]
    fn test_store_config_explicit_path_wins() {
        let config = StoreConfig {
            path: Some(PathBuf::from("/tmp/custom.json")),
            secret: None,
        };
        assert_eq!(config.resolved_path(), PathBuf::from("/tmp/custom.json"));
    }

    // ==================== Config Loading Tests ====================

    #[test]
    fn test_config_load_with_defaults() {
        let config = AppConfig::load().expect("Config should load");

        assert!(!config.api.base_url.is_empty());
        assert!(!config.predictions.base_url.is_empty());
        assert!(config.network.request_timeout_secs > 0);
        assert!(config.predictions.weekday_scale_factor > 0.0);
        assert!(config.predictions.hourly_start_hour < config.predictions.hourly_end_hour);
    }

    // ==================== Environment Variable Override Tests ====================

    /// Helper to set an environment variable for the duration of `f`.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // SAFETY: Test environment, keys are unique to each test
        unsafe {
            std::env::set_var(key, value);
        }
        let result = f();
        unsafe {
            std::env::remove_var(key);
        }
        result
    }

    #[test]
    fn test_env_var_overrides_api_base_url() {
        let config = with_env_var("OCCUPI__API__BASE_URL", "https://test.example.com", || {
            AppConfig::load().expect("Config should load")
        });

        assert_eq!(config.api.base_url, "https://test.example.com");
    }

    #[test]
    fn test_env_var_overrides_store_secret() {
        let config = with_env_var("OCCUPI__STORE__SECRET", "hunter2", || {
            AppConfig::load().expect("Config should load")
        });

        assert_eq!(config.store.secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_config_structs_are_debug() {
        let config = NetworkConfig::default();
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("NetworkConfig"));
        assert!(debug_str.contains("request_timeout_secs"));
    }
}
