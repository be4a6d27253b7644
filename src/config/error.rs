//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid backend URL: {0}")]
    InvalidBackendUrl(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("{field} must be within 0..=1, got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),
}
