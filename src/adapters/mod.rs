//! Adapters - Implementations of port interfaces.
//!
//! - `http` - reqwest client for the detection backend
//! - `mock_client` - Scripted in-memory detection backend
//! - `display` - Tracing and recording display surfaces
//! - `console` - Line commands for the binary's front end

pub mod console;
pub mod display;
pub mod http;
pub mod mock_client;

pub use display::{DisplayEvent, RecordingDisplay, TracingDisplay};
pub use http::HttpDetectionClient;
pub use mock_client::{sample_detection, MockCall, MockDetectionClient, MockReply};
