//! Detection request parameters and canonical results.

use serde::{Deserialize, Serialize};

use super::{DensityLevel, LightTimings};

/// Slider-derived parameters passed through to the detection API.
///
/// No local validation: whatever the controls hold is sent as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    pub confidence: f64,
    pub iou: f64,
}

impl DetectionParams {
    pub fn new(confidence: f64, iou: f64) -> Self {
        Self { confidence, iou }
    }
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            iou: 0.5,
        }
    }
}

/// One detection, normalized from whichever payload revision produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Per-class vehicle counts; order matches the model's class list.
    pub counts: Vec<u32>,
    pub timings: LightTimings,
    pub processed_image_url: String,
    pub input_image_url: Option<String>,
}

impl DetectionResult {
    pub fn total_vehicles(&self) -> u32 {
        DensityLevel::from_counts(&self.counts).0
    }

    pub fn density(&self) -> DensityLevel {
        DensityLevel::from_counts(&self.counts).1
    }
}

/// Image payload for `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A named file read from disk or picked by the user.
    File { file_name: String, bytes: Vec<u8> },
    /// A remote image the backend downloads itself.
    Url(String),
    /// Raw encoded image without a name, e.g. a frame grabbed from the preview.
    Blob(Vec<u8>),
}

impl ImageSource {
    /// Short description for logs; never includes the image bytes.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::File { file_name, bytes } => {
                format!("file {} ({} bytes)", file_name, bytes.len())
            }
            ImageSource::Url(url) => format!("url {}", url),
            ImageSource::Blob(bytes) => format!("blob ({} bytes)", bytes.len()),
        }
    }
}

/// A detection published out-of-band on the last-detection side channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedDetection {
    pub timestamp: f64,
    pub detection: DetectionResult,
}

/// Result of the camera diagnostic endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraStatus {
    pub ok: bool,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub fps: f64,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(counts: Vec<u32>) -> DetectionResult {
        DetectionResult {
            counts,
            timings: LightTimings::derive(Some(20.0), None, None, None),
            processed_image_url: "http://cam/static/outputs/a_detect.jpg".to_string(),
            input_image_url: None,
        }
    }

    #[test]
    fn total_and_density_follow_counts() {
        let d = detection(vec![2, 3, 0, 1, 0, 0]);
        assert_eq!(d.total_vehicles(), 6);
        assert_eq!(d.density(), DensityLevel::Medium);
    }

    #[test]
    fn describe_hides_bytes() {
        let source = ImageSource::File {
            file_name: "junction.jpg".to_string(),
            bytes: vec![0; 2048],
        };
        assert_eq!(source.describe(), "file junction.jpg (2048 bytes)");
        assert_eq!(ImageSource::Blob(vec![1, 2, 3]).describe(), "blob (3 bytes)");
    }

    #[test]
    fn camera_status_tolerates_missing_fields() {
        let status: CameraStatus =
            serde_json::from_str(r#"{"ok": false, "error": "cannot open camera"}"#).unwrap();
        assert!(!status.ok);
        assert_eq!(status.width, 0);
        assert_eq!(status.error.as_deref(), Some("cannot open camera"));
    }
}
