//! Application layer - the cycle controller and its scheduling primitive.

mod controller;
pub mod timer;

pub use controller::{CaptureOutcome, CycleController, CycleSettings, PollOutcome};
pub use timer::Timer;
