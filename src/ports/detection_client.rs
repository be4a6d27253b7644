//! Detection Client Port - Interface to the detection backend.
//!
//! Implementations normalize every payload revision into the canonical
//! [`DetectionResult`] before it reaches the controller, so legacy field
//! names never leak past this boundary.

use async_trait::async_trait;

use crate::domain::{
    CameraStatus, DetectionError, DetectionParams, DetectionResult, ImageSource,
    PublishedDetection,
};

/// Port for the detection backend.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    /// Asks the backend to grab one camera frame and analyze it.
    async fn capture(&self, params: DetectionParams) -> Result<DetectionResult, DetectionError>;

    /// Sends an image (file, URL or raw blob) for analysis.
    async fn upload(
        &self,
        source: ImageSource,
        params: DetectionParams,
    ) -> Result<DetectionResult, DetectionError>;

    /// Reads the side-channel detection published by an external process.
    ///
    /// Returns `Ok(None)` when nothing has been published yet.
    async fn last_detection(&self) -> Result<Option<PublishedDetection>, DetectionError>;

    /// Camera diagnostics (can it open, frame size, fps).
    async fn camera_status(&self) -> Result<CameraStatus, DetectionError>;

    /// Absolute URL of the live camera stream, rendered as is by the display.
    fn camera_stream_url(&self) -> String;
}
