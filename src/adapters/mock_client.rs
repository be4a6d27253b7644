//! Mock Detection Client for testing and offline runs.
//!
//! Provides a configurable in-memory implementation of the DetectionClient
//! port, so the controller can run without a camera or inference server.
//!
//! # Features
//!
//! - Pre-configured replies (consumed in order)
//! - Simulated latency
//! - A settable side-channel detection
//! - Call tracking, including the peak number of concurrent requests
//!
//! # Example
//!
//! ```ignore
//! let client = MockDetectionClient::new()
//!     .with_detection(sample_detection(vec![2, 3, 0, 1, 0, 0], 20.0))
//!     .with_delay(Duration::from_millis(100));
//!
//! let result = client.capture(DetectionParams::default()).await?;
//! assert_eq!(result.total_vehicles(), 6);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::{
    CameraStatus, DetectionError, DetectionParams, DetectionResult, ImageSource, LightTimings,
    PublishedDetection,
};
use crate::ports::DetectionClient;

/// A configured reply to the next capture or upload.
#[derive(Debug, Clone)]
pub enum MockReply {
    Success(DetectionResult),
    Error(DetectionError),
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Capture(DetectionParams),
    Upload(ImageSource, DetectionParams),
    LastDetection,
}

/// Builds a detection with the given counts and red time, everything else
/// derived or defaulted.
pub fn sample_detection(counts: Vec<u32>, red_seconds: f64) -> DetectionResult {
    DetectionResult {
        counts,
        timings: LightTimings::derive(Some(red_seconds), None, None, None),
        processed_image_url: "http://mock/static/outputs/frame_detect.jpg".to_string(),
        input_image_url: Some("http://mock/static/uploads/frame.jpg".to_string()),
    }
}

/// Mock detection backend.
#[derive(Debug, Clone)]
pub struct MockDetectionClient {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    published: Arc<Mutex<Option<PublishedDetection>>>,
    published_error: Arc<Mutex<Option<DetectionError>>>,
    camera: CameraStatus,
    delay: Duration,
    calls: Arc<Mutex<Vec<MockCall>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl Default for MockDetectionClient {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDetectionClient {
    /// Creates a mock with no scripted replies and a healthy camera.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            published: Arc::new(Mutex::new(None)),
            published_error: Arc::new(Mutex::new(None)),
            camera: CameraStatus {
                ok: true,
                width: 640,
                height: 480,
                fps: 30.0,
                error: None,
            },
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queues a successful detection.
    pub fn with_detection(self, detection: DetectionResult) -> Self {
        self.push_reply(MockReply::Success(detection));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: DetectionError) -> Self {
        self.push_reply(MockReply::Error(error));
        self
    }

    /// Sets simulated latency per capture/upload.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the camera status to report.
    pub fn with_camera_status(mut self, camera: CameraStatus) -> Self {
        self.camera = camera;
        self
    }

    /// Queues a reply on an already shared mock.
    pub fn push_reply(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Replaces the side-channel detection.
    pub fn publish(&self, timestamp: f64, detection: DetectionResult) {
        *lock(&self.published) = Some(PublishedDetection {
            timestamp,
            detection,
        });
    }

    /// Makes the next side-channel reads fail until cleared with `None`.
    pub fn set_published_error(&self, error: Option<DetectionError>) {
        *lock(&self.published_error) = error;
    }

    /// Capture and upload calls made so far.
    pub fn request_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| !matches!(c, MockCall::LastDetection))
            .count()
    }

    /// Side-channel reads made so far.
    pub fn poll_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, MockCall::LastDetection))
            .count()
    }

    /// Most capture/upload requests ever outstanding at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    fn next_reply(&self) -> MockReply {
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| MockReply::Success(sample_detection(vec![0; 6], 20.0)))
    }

    async fn respond(&self, call: MockCall) -> Result<DetectionResult, DetectionError> {
        lock(&self.calls).push(call);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_reply() {
            MockReply::Success(detection) => Ok(detection),
            MockReply::Error(error) => Err(error),
        }
    }
}

#[async_trait]
impl DetectionClient for MockDetectionClient {
    async fn capture(&self, params: DetectionParams) -> Result<DetectionResult, DetectionError> {
        self.respond(MockCall::Capture(params)).await
    }

    async fn upload(
        &self,
        source: ImageSource,
        params: DetectionParams,
    ) -> Result<DetectionResult, DetectionError> {
        self.respond(MockCall::Upload(source, params)).await
    }

    async fn last_detection(&self) -> Result<Option<PublishedDetection>, DetectionError> {
        lock(&self.calls).push(MockCall::LastDetection);
        if let Some(error) = lock(&self.published_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.published).clone())
    }

    async fn camera_status(&self) -> Result<CameraStatus, DetectionError> {
        Ok(self.camera.clone())
    }

    fn camera_stream_url(&self) -> String {
        "http://mock/camera_stream".to_string()
    }
}
