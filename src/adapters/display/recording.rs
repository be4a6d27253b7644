//! In-memory display that records every update.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::domain::{DensityLevel, LightTimings};
use crate::ports::DisplayAdapter;

/// One display update.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Counts(Vec<u32>),
    Density { total: u32, level: DensityLevel },
    LightTimes(LightTimings),
    ProcessedImage(String),
    InputImage(String),
    Error(String),
    Elapsed(Duration),
    Countdown(u32),
    Busy(bool),
    CameraStream(String),
}

/// Display that stores updates in order.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn events_mut(&self) -> MutexGuard<'_, Vec<DisplayEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: DisplayEvent) {
        self.events_mut().push(event);
    }

    /// All updates so far.
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events_mut().clone()
    }

    pub fn clear(&self) {
        self.events_mut().clear();
    }

    /// Most recent non-empty error message, if the banner is showing one.
    pub fn current_error(&self) -> Option<String> {
        self.events_mut().iter().rev().find_map(|e| match e {
            DisplayEvent::Error(message) => Some(message.clone()),
            _ => None,
        })
        .filter(|m| !m.is_empty())
    }

    pub fn last_density(&self) -> Option<(u32, DensityLevel)> {
        self.events_mut().iter().rev().find_map(|e| match e {
            DisplayEvent::Density { total, level } => Some((*total, *level)),
            _ => None,
        })
    }

    pub fn last_light_times(&self) -> Option<LightTimings> {
        self.events_mut().iter().rev().find_map(|e| match e {
            DisplayEvent::LightTimes(t) => Some(*t),
            _ => None,
        })
    }

    /// Countdown values in the order they were shown.
    pub fn countdowns(&self) -> Vec<u32> {
        self.events_mut()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Countdown(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// Busy toggles in the order they were shown.
    pub fn busy_toggles(&self) -> Vec<bool> {
        self.events_mut()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Busy(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Number of detections rendered (one light-times update each).
    pub fn detections_shown(&self) -> usize {
        self.events_mut()
            .iter()
            .filter(|e| matches!(e, DisplayEvent::LightTimes(_)))
            .count()
    }
}

impl DisplayAdapter for RecordingDisplay {
    fn show_counts(&self, counts: &[u32]) {
        self.record(DisplayEvent::Counts(counts.to_vec()));
    }

    fn show_density(&self, total: u32, level: DensityLevel) {
        self.record(DisplayEvent::Density { total, level });
    }

    fn show_light_times(&self, timings: LightTimings) {
        self.record(DisplayEvent::LightTimes(timings));
    }

    fn show_processed_image(&self, url: &str) {
        self.record(DisplayEvent::ProcessedImage(url.to_string()));
    }

    fn show_input_image(&self, url: &str) {
        self.record(DisplayEvent::InputImage(url.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.record(DisplayEvent::Error(message.to_string()));
    }

    fn show_elapsed(&self, elapsed: Duration) {
        self.record(DisplayEvent::Elapsed(elapsed));
    }

    fn show_countdown(&self, remaining: u32) {
        self.record(DisplayEvent::Countdown(remaining));
    }

    fn set_busy(&self, busy: bool) {
        self.record(DisplayEvent::Busy(busy));
    }

    fn show_camera_stream(&self, url: &str) {
        self.record(DisplayEvent::CameraStream(url.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_error_clears_the_banner() {
        let display = RecordingDisplay::new();
        display.show_error("Error: server error: 500");
        assert_eq!(display.current_error().as_deref(), Some("Error: server error: 500"));

        display.show_error("");
        assert_eq!(display.current_error(), None);
    }

    #[test]
    fn accessors_pick_latest_values() {
        let display = RecordingDisplay::new();
        display.show_density(3, DensityLevel::Low);
        display.show_density(12, DensityLevel::High);
        display.show_countdown(2);
        display.show_countdown(1);

        assert_eq!(display.last_density(), Some((12, DensityLevel::High)));
        assert_eq!(display.countdowns(), vec![2, 1]);
    }
}
