//! Traffic-light timings derived from a detection payload.
//!
//! The backend has shipped several payload revisions. Red time arrives
//! either as `red_seconds` or as the older `total_seconds`; yellow and
//! green are optional. The derivation fills the gaps:
//!
//! - `yellow = yellow_seconds ?? 3`
//! - `red = red_seconds ?? total_seconds ?? 0`
//! - `green = green_seconds ?? max(0, red - yellow)`

use serde::{Deserialize, Serialize};

/// Yellow phase used when the payload does not carry one.
pub const DEFAULT_YELLOW_SECONDS: f64 = 3.0;

/// Red, yellow and green durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LightTimings {
    pub red: f64,
    pub yellow: f64,
    pub green: f64,
}

impl LightTimings {
    /// Derives timings from the optional payload fields.
    ///
    /// `red_seconds` takes precedence over the legacy `total_seconds`.
    pub fn derive(
        red_seconds: Option<f64>,
        total_seconds: Option<f64>,
        yellow_seconds: Option<f64>,
        green_seconds: Option<f64>,
    ) -> Self {
        let yellow = yellow_seconds.unwrap_or(DEFAULT_YELLOW_SECONDS);
        let red = red_seconds.or(total_seconds).unwrap_or(0.0);
        let green = green_seconds.unwrap_or_else(|| (red - yellow).max(0.0));

        Self { red, yellow, green }
    }

    /// Whole seconds the green countdown should run for.
    ///
    /// Fractional values round up so that any positive green time arms
    /// at least one tick.
    pub fn countdown_seconds(&self) -> u32 {
        if self.green > 0.0 {
            self.green.ceil().min(u32::MAX as f64) as u32
        } else {
            0
        }
    }
}
