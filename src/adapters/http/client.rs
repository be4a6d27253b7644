//! HTTP Detection Client - reqwest implementation of DetectionClient.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | capture | `POST /camera_capture?conf=..&iou=..` |
//! | upload | `POST /upload` (multipart `image` or `image_url`, `conf`, `iou`) |
//! | last detection | `GET /static/last_detection.json?t=<millis>` |
//! | camera status | `GET /camera_status` |
//! | camera stream | `GET /camera_stream` (URL only, never fetched here) |
//!
//! # Two-step capture
//!
//! Older backends answer `/camera_capture` with just the saved frame's
//! `image_url`. The client then sends that URL through `/upload` so the
//! caller always gets a full detection back.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::dto::{resolve_url, DetectionPayload};
use crate::domain::{
    CameraStatus, DetectionError, DetectionParams, DetectionResult, ImageSource,
    PublishedDetection,
};
use crate::ports::DetectionClient;

const CAPTURE_PATH: &str = "camera_capture";
const UPLOAD_PATH: &str = "upload";
const LAST_DETECTION_PATH: &str = "static/last_detection.json";
const CAMERA_STATUS_PATH: &str = "camera_status";
const CAMERA_STREAM_PATH: &str = "camera_stream";

/// File name sent for unnamed blobs.
const BLOB_FILE_NAME: &str = "frame.jpg";

/// Detection backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDetectionClient {
    base_url: Url,
    client: Client,
    timeout: Duration,
}

impl HttpDetectionClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DetectionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: normalize_base(base_url)?,
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, DetectionError> {
        self.base_url
            .join(path)
            .map_err(|e| DetectionError::network(format!("invalid endpoint {}: {}", path, e)))
    }

    /// Sends a request, mapping transport failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response, DetectionError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                DetectionError::network(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else if e.is_connect() {
                DetectionError::network(format!("connection failed: {}", e))
            } else {
                DetectionError::network(e.to_string())
            }
        })
    }

    /// Rejects non-success statuses and decodes the body.
    async fn read_payload(response: Response) -> Result<DetectionPayload, DetectionError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DetectionError::network(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            if let Ok(payload) = DetectionPayload::from_slice(&body) {
                if let Some(message) = payload.error_message() {
                    tracing::warn!(status = status.as_u16(), "backend rejected request: {}", message);
                }
            }
            return Err(DetectionError::HttpStatus {
                status: status.as_u16(),
            });
        }

        DetectionPayload::from_slice(&body)
    }

    fn detection_form(source: ImageSource, params: DetectionParams) -> Result<Form, DetectionError> {
        let form = Form::new()
            .text("conf", params.confidence.to_string())
            .text("iou", params.iou.to_string());

        let form = match source {
            ImageSource::File { file_name, bytes } => {
                let mime = mime_for(&file_name);
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(mime)
                    .map_err(|e| DetectionError::network(e.to_string()))?;
                form.part("image", part)
            }
            ImageSource::Blob(bytes) => {
                let part = Part::bytes(bytes)
                    .file_name(BLOB_FILE_NAME)
                    .mime_str("image/jpeg")
                    .map_err(|e| DetectionError::network(e.to_string()))?;
                form.part("image", part)
            }
            ImageSource::Url(url) => form.text("image_url", url.trim().to_string()),
        };

        Ok(form)
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn capture(&self, params: DetectionParams) -> Result<DetectionResult, DetectionError> {
        let request = self
            .client
            .post(self.endpoint(CAPTURE_PATH)?)
            .query(&[("conf", params.confidence), ("iou", params.iou)]);

        let payload = Self::read_payload(self.send(request).await?).await?;

        if payload.error_message().is_none() && payload.is_frame_reference() {
            if let Some(image_url) = payload.image_url.as_deref() {
                let frame_url = resolve_url(&self.base_url, image_url);
                tracing::debug!(frame_url = %frame_url, "capture returned a frame reference; uploading it");
                return self.upload(ImageSource::Url(frame_url), params).await;
            }
        }

        payload.into_result(&self.base_url)
    }

    async fn upload(
        &self,
        source: ImageSource,
        params: DetectionParams,
    ) -> Result<DetectionResult, DetectionError> {
        let form = Self::detection_form(source, params)?;
        let request = self.client.post(self.endpoint(UPLOAD_PATH)?).multipart(form);

        let payload = Self::read_payload(self.send(request).await?).await?;
        payload.into_result(&self.base_url)
    }

    async fn last_detection(&self) -> Result<Option<PublishedDetection>, DetectionError> {
        let request = self
            .client
            .get(self.endpoint(LAST_DETECTION_PATH)?)
            .query(&[("t", cache_buster())])
            .header("Cache-Control", "no-cache");

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let payload = Self::read_payload(response).await?;
        payload.into_published(&self.base_url)
    }

    async fn camera_status(&self) -> Result<CameraStatus, DetectionError> {
        let request = self.client.get(self.endpoint(CAMERA_STATUS_PATH)?);
        let response = self.send(request).await?;
        let status = response.status();

        let body = response
            .bytes()
            .await
            .map_err(|e| DetectionError::network(format!("failed to read body: {}", e)))?;

        // The endpoint reports an unusable camera as a 500 with a status body.
        match serde_json::from_slice::<CameraStatus>(&body) {
            Ok(camera) => Ok(camera),
            Err(_) if !status.is_success() => Err(DetectionError::HttpStatus {
                status: status.as_u16(),
            }),
            Err(e) => Err(DetectionError::malformed(e.to_string())),
        }
    }

    fn camera_stream_url(&self) -> String {
        resolve_url(&self.base_url, CAMERA_STREAM_PATH)
    }
}

/// Parses the base URL and makes sure it ends in `/` so endpoint joins
/// append instead of replacing the last path segment.
fn normalize_base(raw: &str) -> Result<Url, DetectionError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| DetectionError::network(format!("invalid backend URL '{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
