//! Display adapters.
//!
//! - `TracingDisplay` renders every update as a structured log line
//! - `RecordingDisplay` keeps every update in memory for assertions

mod recording;
mod tracing_display;

pub use recording::{DisplayEvent, RecordingDisplay};
pub use tracing_display::TracingDisplay;

use std::time::Duration;

/// Renders an elapsed duration as `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_zero_padded() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(61_900)), "00:01:01");
        assert_eq!(format_elapsed(Duration::from_secs(3600 * 12 + 5)), "12:00:05");
    }
}
