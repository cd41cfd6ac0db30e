// Error types for the ad targeting service
//
// Model call failures never leave the segmentation pipeline (they turn into "N/A"),
// so only ApiError ever reaches an HTTP client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::time::Duration;
use thiserror::Error;

/// Vision model invocation errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Image encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Circuit breaker is open, model is unavailable")]
    CircuitOpen,

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),
}

impl ModelError {
    /// The call ran past the per-question deadline
    pub fn is_timeout(&self) -> bool {
        match self {
            ModelError::Timeout(_) => true,
            ModelError::RequestFailed(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown model backend: {0} (expected 'gemini' or 'openai')")]
    UnknownBackend(String),

    #[error("No API key configured for the {0} backend (set MODEL_API_KEY)")]
    MissingApiKey(&'static str),

    #[error("Model timeout must be > 0 seconds")]
    InvalidTimeout,

    #[error("Upload limit must be > 0 MB")]
    InvalidUploadLimit,

    #[error("Invalid circuit breaker config: {0}")]
    InvalidCircuitBreaker(String),

    #[error("Invalid model base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid boolean for {key}: {value:?} (expected true/false, 1/0, yes/no, on/off)")]
    InvalidBool { key: &'static str, value: String },
}

/// Errors surfaced to HTTP clients as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image uploaded")]
    NoImage,

    #[error("{0}")]
    ImageDecode(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoImage => StatusCode::BAD_REQUEST,
            ApiError::ImageDecode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::NoImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::ImageDecode("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::NoImage.to_string(), "No image uploaded");
    }

    #[test]
    fn test_model_error_messages() {
        let err = ModelError::BadStatus {
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "Model API returned 503: overloaded");
        assert!(ModelError::Timeout(Duration::from_secs(2))
            .to_string()
            .contains("timed out"));
    }

    #[test]
    fn test_is_timeout() {
        assert!(ModelError::Timeout(Duration::from_secs(30)).is_timeout());
        assert!(!ModelError::CircuitOpen.is_timeout());
        assert!(!ModelError::InvalidResponse("empty".into()).is_timeout());
    }
}
