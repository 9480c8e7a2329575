//! Error types for the Vision API adapter

use reqwest::StatusCode;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, VisionError>;

/// Vision API error types
#[derive(Debug, Error)]
pub enum VisionError {
    /// Refresh-token exchange was rejected or returned an unusable body
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Any authenticated call that came back with a non-2xx status
    #[error("Request failed with status {status}: {body}")]
    Request { status: StatusCode, body: String },

    /// A payload is missing something the caller or the API relies on
    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl VisionError {
    /// HTTP status of the failed call, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::Request { .. } => "request",
            Self::ResponseShape(_) => "response_shape",
            Self::Transport(_) => "transport",
            Self::Configuration(_) => "configuration",
        }
    }
}

impl From<config::ConfigError> for VisionError {
    fn from(e: config::ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_carries_status() {
        let err = VisionError::Request {
            status: StatusCode::NOT_FOUND,
            body: "no such experiment".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.kind(), "request");
        assert!(err.to_string().contains("no such experiment"));
    }

    #[test]
    fn test_shape_error_has_no_status() {
        let err = VisionError::ResponseShape("missing id_token".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.kind(), "response_shape");
    }
}
