//! Wire payloads of the detection backend.
//!
//! The backend has shipped several revisions of the same response. Field
//! names come in snake_case and camelCase, red time arrives as either
//! `red_seconds` or `total_seconds`, and the bare camera capture endpoint
//! may answer with only an `image_url`. Everything is optional here and
//! normalized into [`DetectionResult`] on the way out.

use reqwest::Url;
use serde::Deserialize;

use crate::domain::{DetectionError, DetectionResult, LightTimings, PublishedDetection};

/// Any detection-shaped response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionPayload {
    #[serde(default)]
    pub counts: Option<Vec<u32>>,

    #[serde(default, alias = "processedImageUrl")]
    pub processed_image_url: Option<String>,

    #[serde(default, alias = "inputImageUrl")]
    pub input_image_url: Option<String>,

    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,

    #[serde(default, alias = "redSeconds")]
    pub red_seconds: Option<f64>,

    #[serde(default, alias = "totalSeconds")]
    pub total_seconds: Option<f64>,

    #[serde(default, alias = "yellowSeconds")]
    pub yellow_seconds: Option<f64>,

    #[serde(default, alias = "greenSeconds")]
    pub green_seconds: Option<f64>,

    #[serde(default)]
    pub error: Option<String>,

    /// Only present on the last-detection side channel.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl DetectionPayload {
    /// Parses a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, DetectionError> {
        serde_json::from_slice(body).map_err(|e| DetectionError::malformed(e.to_string()))
    }

    /// The `error` field, if it carries a message.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }

    /// True when the body only references a saved frame that still needs
    /// to be sent through `/upload` for analysis.
    pub fn is_frame_reference(&self) -> bool {
        self.counts.is_none() && self.processed_image_url.is_none() && self.image_url.is_some()
    }

    /// Normalizes into the canonical result, resolving relative image URLs
    /// against `base`.
    pub fn into_result(self, base: &Url) -> Result<DetectionResult, DetectionError> {
        if let Some(message) = self.error_message() {
            return Err(DetectionError::application(message));
        }

        let timings = LightTimings::derive(
            self.red_seconds,
            self.total_seconds,
            self.yellow_seconds,
            self.green_seconds,
        );

        let processed_image_url = self
            .processed_image_url
            .filter(|u| !u.is_empty())
            .map(|u| resolve_url(base, &u))
            .unwrap_or_default();

        let input_image_url = self
            .input_image_url
            .or(self.image_url)
            .filter(|u| !u.is_empty())
            .map(|u| resolve_url(base, &u));

        Ok(DetectionResult {
            counts: self.counts.unwrap_or_default(),
            timings,
            processed_image_url,
            input_image_url,
        })
    }

    /// Normalizes a side-channel body. A missing or zero timestamp means
    /// nothing has been published yet.
    pub fn into_published(self, base: &Url) -> Result<Option<PublishedDetection>, DetectionError> {
        let timestamp = match self.timestamp {
            Some(ts) if ts > 0.0 => ts,
            _ => return Ok(None),
        };

        let detection = self.into_result(base)?;
        Ok(Some(PublishedDetection {
            timestamp,
            detection,
        }))
    }
}

/// Joins `raw` onto `base`; absolute URLs pass through unchanged.
pub fn resolve_url(base: &Url, raw: &str) -> String {
    base.join(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("http://cam.local:5000/").unwrap()
    }

    fn parse(value: serde_json::Value) -> DetectionPayload {
        DetectionPayload::from_slice(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn snake_case_payload_normalizes() {
        let payload = parse(json!({
            "processed_image_url": "/static/outputs/a_detect.jpg",
            "input_image_url": "/static/uploads/a.jpg",
            "counts": [2, 3, 0, 1, 0, 0],
            "total_seconds": 45,
            "status": "processing",
            "red_seconds": 45,
            "yellow_seconds": 3,
            "green_seconds": 42
        }));

        let result = payload.into_result(&base()).unwrap();
        assert_eq!(result.counts, vec![2, 3, 0, 1, 0, 0]);
        assert_eq!(result.timings, LightTimings { red: 45.0, yellow: 3.0, green: 42.0 });
        assert_eq!(
            result.processed_image_url,
            "http://cam.local:5000/static/outputs/a_detect.jpg"
        );
        assert_eq!(
            result.input_image_url.as_deref(),
            Some("http://cam.local:5000/static/uploads/a.jpg")
        );
    }

    #[test]
    fn camel_case_payload_normalizes_identically() {
        let snake = parse(json!({
            "counts": [1, 1], "red_seconds": 20, "processed_image_url": "/p.jpg"
        }))
        .into_result(&base())
        .unwrap();
        let camel = parse(json!({
            "counts": [1, 1], "redSeconds": 20, "processedImageUrl": "/p.jpg"
        }))
        .into_result(&base())
        .unwrap();

        assert_eq!(snake, camel);
    }

    #[test]
    fn red_seconds_beats_total_seconds() {
        let result = parse(json!({"redSeconds": 20, "totalSeconds": 90}))
            .into_result(&base())
            .unwrap();
        assert_eq!(result.timings.red, 20.0);
        assert_eq!(result.timings.green, 17.0);
    }

    #[test]
    fn error_field_becomes_application_error() {
        let err = parse(json!({"error": "cannot open camera on server"}))
            .into_result(&base())
            .unwrap_err();
        assert_eq!(err, DetectionError::application("cannot open camera on server"));
    }

    #[test]
    fn blank_error_field_is_ignored() {
        assert!(parse(json!({"error": "", "counts": []})).into_result(&base()).is_ok());
        assert!(parse(json!({"error": null})).into_result(&base()).is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let result = parse(json!({})).into_result(&base()).unwrap();
        assert!(result.counts.is_empty());
        assert_eq!(result.processed_image_url, "");
        assert_eq!(result.input_image_url, None);
        assert_eq!(result.timings, LightTimings { red: 0.0, yellow: 3.0, green: 0.0 });
    }

    #[test]
    fn legacy_image_url_fills_input_image() {
        let result = parse(json!({"counts": [0], "image_url": "http://other/x.jpg"}))
            .into_result(&base())
            .unwrap();
        assert_eq!(result.input_image_url.as_deref(), Some("http://other/x.jpg"));
    }

    #[test]
    fn bare_image_url_is_a_frame_reference() {
        assert!(parse(json!({"image_url": "/static/uploads/camera_1.jpg"})).is_frame_reference());
        assert!(!parse(json!({"image_url": "/x.jpg", "counts": [1]})).is_frame_reference());
        assert!(!parse(json!({"counts": [1]})).is_frame_reference());
    }

    #[test]
    fn published_payload_requires_positive_timestamp() {
        assert_eq!(parse(json!({"counts": [1]})).into_published(&base()).unwrap(), None);
        assert_eq!(
            parse(json!({"timestamp": 0, "counts": [1]}))
                .into_published(&base())
                .unwrap(),
            None
        );

        let published = parse(json!({"timestamp": 1718000000.5, "counts": [4, 2]}))
            .into_published(&base())
            .unwrap()
            .unwrap();
        assert_eq!(published.timestamp, 1718000000.5);
        assert_eq!(published.detection.counts, vec![4, 2]);
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = DetectionPayload::from_slice(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, DetectionError::MalformedPayload(_)));
    }

    #[test]
    fn resolve_keeps_absolute_urls() {
        assert_eq!(resolve_url(&base(), "https://cdn/x.jpg"), "https://cdn/x.jpg");
        assert_eq!(resolve_url(&base(), "/static/a.jpg"), "http://cam.local:5000/static/a.jpg");
    }
}
