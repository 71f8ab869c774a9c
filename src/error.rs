//! Domain-specific error types for cx-lab

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the cx-lab wizard, generators and analysis service
#[derive(Error, Debug)]
pub enum CxLabError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Step {requested} is locked: complete step {blocking} first")]
    StepLocked { requested: usize, blocking: usize },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("No analysis result to refine")]
    NoResult,

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Automation analysis failed: {message}")]
    Analysis { message: String },

    #[error("Analysis cancelled: {session_id}")]
    Cancelled { session_id: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CxLabError {
    pub fn validation(message: impl Into<String>) -> Self {
        CxLabError::Validation {
            message: message.into(),
        }
    }

    pub fn session_not_found(id: impl Into<String>) -> Self {
        CxLabError::NotFound {
            resource: "Analysis session".into(),
            id: id.into(),
        }
    }

    /// HTTP status used when this error crosses the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            CxLabError::Validation { .. } | CxLabError::StepLocked { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CxLabError::NotFound { .. } => StatusCode::NOT_FOUND,
            CxLabError::NoResult => StatusCode::BAD_REQUEST,
            CxLabError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CxLabError::Cancelled { .. } => StatusCode::CONFLICT,
            CxLabError::Unauthorized => StatusCode::UNAUTHORIZED,
            CxLabError::Transport { .. } => StatusCode::BAD_GATEWAY,
            CxLabError::Config { .. }
            | CxLabError::Analysis { .. }
            | CxLabError::Serialization { .. }
            | CxLabError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for CxLabError {
    fn from(err: anyhow::Error) -> Self {
        CxLabError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CxLabError {
    fn from(err: serde_json::Error) -> Self {
        CxLabError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CxLabError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return CxLabError::Timeout {
                operation: "HTTP request".into(),
                timeout_ms: 0,
            };
        }
        CxLabError::Transport {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<toml::de::Error> for CxLabError {
    fn from(err: toml::de::Error) -> Self {
        CxLabError::Config {
            message: err.to_string(),
        }
    }
}

/// Errors leave the API as `{"detail": "..."}`, the shape the wizard frontends read
impl IntoResponse for CxLabError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Result type alias for cx-lab operations
pub type Result<T> = std::result::Result<T, CxLabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_api_contract() {
        assert_eq!(
            CxLabError::session_not_found("abc").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(CxLabError::NoResult.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CxLabError::validation("blank").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CxLabError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_not_found_message_names_resource() {
        let err = CxLabError::session_not_found("1234");
        assert_eq!(err.to_string(), "Analysis session not found: 1234");
    }
}
