//! Display Port - Where the controller renders its output.

use std::time::Duration;

use crate::domain::{DensityLevel, LightTimings};

/// Port for the dashboard surface.
///
/// Calls are fire-and-forget and made outside the controller's lock, so an
/// implementation may take its own locks freely but must not call back into
/// the controller synchronously.
pub trait DisplayAdapter: Send + Sync {
    /// Per-class counts, in model class order.
    fn show_counts(&self, counts: &[u32]);

    /// Total vehicle count and its density bucket.
    fn show_density(&self, total: u32, level: DensityLevel);

    fn show_light_times(&self, timings: LightTimings);

    fn show_processed_image(&self, url: &str);

    fn show_input_image(&self, url: &str);

    /// Error banner. An empty message clears it.
    fn show_error(&self, message: &str);

    /// Elapsed time of the in-flight request; zero once it settles.
    fn show_elapsed(&self, elapsed: Duration);

    /// Remaining green seconds of the armed countdown.
    fn show_countdown(&self, remaining: u32);

    /// Busy/idle toggle for the primary capture control.
    fn set_busy(&self, busy: bool);

    fn show_camera_stream(&self, url: &str);
}
