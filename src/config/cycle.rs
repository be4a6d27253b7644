//! Cycle configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::CycleSettings;
use crate::domain::{CycleMode, DetectionParams};

/// Cycle behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CycleConfig {
    /// Mode at startup
    #[serde(default)]
    pub mode: CycleMode,

    /// Initial confidence slider value
    #[serde(default = "default_threshold")]
    pub confidence: f64,

    /// Initial IoU slider value
    #[serde(default = "default_threshold")]
    pub iou: f64,

    /// Poll the last-detection side channel
    #[serde(default = "default_polling_enabled")]
    pub polling_enabled: bool,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Length of one green-countdown step
    #[serde(default = "default_countdown_tick")]
    pub countdown_tick_ms: u64,

    /// Refresh period of the elapsed-time display
    #[serde(default = "default_elapsed_tick")]
    pub elapsed_tick_ms: u64,
}

impl CycleConfig {
    /// Controller settings for this configuration
    pub fn settings(&self) -> CycleSettings {
        CycleSettings {
            mode: self.mode,
            params: DetectionParams::new(self.confidence, self.iou),
            polling_enabled: self.polling_enabled,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            countdown_tick: Duration::from_millis(self.countdown_tick_ms),
            elapsed_tick: Duration::from_millis(self.elapsed_tick_ms),
        }
    }

    /// Validate cycle configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("confidence", self.confidence), ("iou", self.iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ProbabilityOutOfRange { field, value });
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::ZeroPeriod("poll_interval_ms"));
        }
        if self.countdown_tick_ms == 0 {
            return Err(ValidationError::ZeroPeriod("countdown_tick_ms"));
        }
        if self.elapsed_tick_ms == 0 {
            return Err(ValidationError::ZeroPeriod("elapsed_tick_ms"));
        }
        Ok(())
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            mode: CycleMode::default(),
            confidence: default_threshold(),
            iou: default_threshold(),
            polling_enabled: default_polling_enabled(),
            poll_interval_ms: default_poll_interval(),
            countdown_tick_ms: default_countdown_tick(),
            elapsed_tick_ms: default_elapsed_tick(),
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

fn default_polling_enabled() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_countdown_tick() -> u64 {
    1000
}

fn default_elapsed_tick() -> u64 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_config_defaults() {
        let config = CycleConfig::default();
        assert_eq!(config.mode, CycleMode::Manual);
        assert_eq!(config.confidence, 0.5);
        assert!(config.polling_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_conversion() {
        let config = CycleConfig {
            mode: CycleMode::Auto,
            confidence: 0.4,
            poll_interval_ms: 500,
            ..Default::default()
        };
        let settings = config.settings();
        assert_eq!(settings.mode, CycleMode::Auto);
        assert_eq!(settings.params, DetectionParams::new(0.4, 0.5));
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.countdown_tick, Duration::from_secs(1));
        assert_eq!(settings.elapsed_tick, Duration::from_millis(200));
    }

    #[test]
    fn test_validation_probability_range() {
        let config = CycleConfig {
            iou: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ProbabilityOutOfRange { field: "iou", value: 1.5 })
        );
    }

    #[test]
    fn test_validation_zero_countdown_tick() {
        let config = CycleConfig {
            countdown_tick_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroPeriod("countdown_tick_ms"))
        );
    }
}
