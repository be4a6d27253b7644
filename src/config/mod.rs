//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `TRAFFIC_CYCLE` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use traffic_cycle::config::AppConfig;
//!
//! let config = AppConfig::load_validated().expect("Invalid configuration");
//!
//! println!("Backend at {}", config.backend.base_url);
//! ```

mod backend;
mod cycle;
mod display;
mod error;
mod logging;

pub use backend::BackendConfig;
pub use cycle::CycleConfig;
pub use display::DisplayConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogConfig, LogFormat};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a manual-mode
/// controller pointed at a local backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Detection backend location and timeouts
    #[serde(default)]
    pub backend: BackendConfig,

    /// Cycle behavior (mode, sliders, timer periods)
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Display labels
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging filter and output format
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TRAFFIC_CYCLE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TRAFFIC_CYCLE__BACKEND__BASE_URL=http://pi.local:5000` -> `backend.base_url`
    /// - `TRAFFIC_CYCLE__CYCLE__MODE=auto` -> `cycle.mode`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRAFFIC_CYCLE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load configuration and validate it in one step.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadError` if values cannot be parsed, or
    /// `ConfigError::ValidationFailed` if a value is out of range.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.backend.validate()?;
        self.cycle.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CycleMode;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; tests touching them run one at a time.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("TRAFFIC_CYCLE__BACKEND__BASE_URL");
        env::remove_var("TRAFFIC_CYCLE__BACKEND__TIMEOUT_SECS");
        env::remove_var("TRAFFIC_CYCLE__CYCLE__MODE");
        env::remove_var("TRAFFIC_CYCLE__CYCLE__CONFIDENCE");
        env::remove_var("TRAFFIC_CYCLE__CYCLE__POLL_INTERVAL_MS");
        env::remove_var("TRAFFIC_CYCLE__LOG__FORMAT");
    }

    #[test]
    fn test_load_with_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.cycle.mode, CycleMode::Manual);
        assert_eq!(config.cycle.poll_interval_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRAFFIC_CYCLE__BACKEND__BASE_URL", "http://pi.local:5000");
        env::set_var("TRAFFIC_CYCLE__CYCLE__MODE", "auto");
        env::set_var("TRAFFIC_CYCLE__CYCLE__CONFIDENCE", "0.35");
        env::set_var("TRAFFIC_CYCLE__LOG__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.backend.base_url, "http://pi.local:5000");
        assert_eq!(config.cycle.mode, CycleMode::Auto);
        assert_eq!(config.cycle.confidence, 0.35);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRAFFIC_CYCLE__CYCLE__POLL_INTERVAL_MS", "0");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_validated_reports_validation_failure() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRAFFIC_CYCLE__CYCLE__POLL_INTERVAL_MS", "0");
        let result = AppConfig::load_validated();
        clear_env();

        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed(ValidationError::ZeroPeriod("poll_interval_ms")))
        ));
    }

    #[test]
    fn test_load_validated_accepts_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load_validated().is_ok());
    }
}
