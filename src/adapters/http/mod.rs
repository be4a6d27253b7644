//! HTTP adapter for the detection backend.

mod client;
pub mod dto;

pub use client::HttpDetectionClient;
pub use dto::DetectionPayload;
