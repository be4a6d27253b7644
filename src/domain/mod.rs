//! Domain layer: detection types, derivations and cycle state.
//!
//! # Module Organization
//!
//! - `detection` - Detection parameters, results and upload sources
//! - `light_timing` - Traffic-light timings derived from a detection payload
//! - `density` - Vehicle density buckets
//! - `cycle` - Cycle mode, phase and owned controller state
//! - `state_machine` - Transition validation for phase enums
//! - `errors` - Detection failure taxonomy

mod cycle;
mod density;
mod detection;
mod errors;
mod ids;
mod light_timing;
mod state_machine;

pub use cycle::{CycleMode, CyclePhase, CycleSnapshot, CycleState};
pub use density::DensityLevel;
pub use detection::{
    CameraStatus, DetectionParams, DetectionResult, ImageSource, PublishedDetection,
};
pub use errors::{DetectionError, TransitionError};
pub use ids::CaptureId;
pub use light_timing::{LightTimings, DEFAULT_YELLOW_SECONDS};
pub use state_machine::StateMachine;
