//! Ports - Interfaces for the controller's collaborators.
//!
//! - `DetectionClient` - The detection backend (capture, upload, side channel)
//! - `DisplayAdapter` - Where results, errors and progress are rendered

mod detection_client;
mod display;

pub use detection_client::DetectionClient;
pub use display::DisplayAdapter;
