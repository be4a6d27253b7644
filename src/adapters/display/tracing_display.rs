//! Display that renders dashboard updates as log lines.

use std::time::Duration;

use super::format_elapsed;
use crate::domain::{DensityLevel, LightTimings};
use crate::ports::DisplayAdapter;

/// Headless dashboard: every update becomes a `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingDisplay {
    class_names: Vec<String>,
}

impl TracingDisplay {
    /// `class_names` label the count slots; unlabeled slots show their index.
    pub fn new(class_names: Vec<String>) -> Self {
        Self { class_names }
    }

    fn label_counts(&self, counts: &[u32]) -> String {
        counts
            .iter()
            .enumerate()
            .map(|(i, c)| match self.class_names.get(i) {
                Some(name) => format!("{}={}", name, c),
                None => format!("class-{}={}", i, c),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl DisplayAdapter for TracingDisplay {
    fn show_counts(&self, counts: &[u32]) {
        tracing::info!(counts = %self.label_counts(counts), "vehicle counts");
    }

    fn show_density(&self, total: u32, level: DensityLevel) {
        tracing::info!(total, density = %level, "traffic density");
    }

    fn show_light_times(&self, timings: LightTimings) {
        tracing::info!(
            green = timings.green,
            yellow = timings.yellow,
            red = timings.red,
            "light times"
        );
    }

    fn show_processed_image(&self, url: &str) {
        tracing::info!(url, "processed image");
    }

    fn show_input_image(&self, url: &str) {
        tracing::debug!(url, "input image");
    }

    fn show_error(&self, message: &str) {
        if !message.is_empty() {
            tracing::warn!("{}", message);
        }
    }

    fn show_elapsed(&self, elapsed: Duration) {
        tracing::trace!(elapsed = %format_elapsed(elapsed), "elapsed");
    }

    fn show_countdown(&self, remaining: u32) {
        tracing::debug!(remaining, "green countdown");
    }

    fn set_busy(&self, busy: bool) {
        tracing::debug!(busy, "capture control");
    }

    fn show_camera_stream(&self, url: &str) {
        tracing::info!(url, "camera stream");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_use_class_names_then_indices() {
        let display = TracingDisplay::new(vec!["car".to_string(), "bus".to_string()]);
        assert_eq!(display.label_counts(&[2, 3, 1]), "car=2, bus=3, class-2=1");
    }
}
