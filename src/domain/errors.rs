//! Error types for the domain layer.

use thiserror::Error;

/// Failures of a single detection request.
///
/// Every variant is recovered by the cycle controller: it is rendered into
/// a display string and the cycle returns to idle. Missing payload fields
/// are never errors; they fall back to defaults during normalization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    /// Transport-level failure (connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("server error: {status}")]
    HttpStatus { status: u16 },

    /// The payload carried an explicit `error` field.
    #[error("{0}")]
    Application(String),

    /// The body could not be decoded as a detection payload.
    #[error("malformed detection payload: {0}")]
    MalformedPayload(String),
}

impl DetectionError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        DetectionError::Network(message.into())
    }

    /// Creates an application error from the payload's `error` field.
    pub fn application(message: impl Into<String>) -> Self {
        DetectionError::Application(message.into())
    }

    /// Creates a malformed payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        DetectionError::MalformedPayload(message.into())
    }

    /// True for failures below the application layer (transport, status, body).
    pub fn is_network(&self) -> bool {
        !matches!(self, DetectionError::Application(_))
    }

    /// Human-readable message for the display's error slot.
    pub fn display_message(&self) -> String {
        format!("Error: {}", self)
    }
}

/// Rejected phase transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot transition from {from} to {to}")]
pub struct TransitionError {
    pub from: String,
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_names_the_status() {
        let err = DetectionError::HttpStatus { status: 500 };
        assert_eq!(err.display_message(), "Error: server error: 500");
    }

    #[test]
    fn application_error_passes_message_through() {
        let err = DetectionError::application("camera not available");
        assert_eq!(err.display_message(), "Error: camera not available");
        assert!(!err.is_network());
    }

    #[test]
    fn transport_and_body_failures_are_network_errors() {
        assert!(DetectionError::network("connection refused").is_network());
        assert!(DetectionError::HttpStatus { status: 404 }.is_network());
        assert!(DetectionError::malformed("expected value").is_network());
    }
}
