/// Unified error types for the guild verifier
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum GuildError {
    /// Signature is malformed or does not recover to an address
    #[error("Signature verification failed: {0}")]
    Verification(String),

    /// Network failure, timeout, non-success status or schema mismatch
    /// from the upstream directory
    #[error("Upstream directory error: {0}")]
    Upstream(String),

    /// Invalid request input or configuration
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GuildError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GuildError::Upstream(format!("request timed out: {}", e))
        } else if e.is_decode() {
            GuildError::Upstream(format!("unexpected response body: {}", e))
        } else {
            GuildError::Upstream(e.to_string())
        }
    }
}

/// Error body returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl GuildError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            GuildError::Validation(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            GuildError::Verification(_) => (StatusCode::UNAUTHORIZED, "InvalidSignature"),
            GuildError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UpstreamError"),
            GuildError::Internal(_) | GuildError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
        }
    }
}

/// Convert GuildError to HTTP response
impl IntoResponse for GuildError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let message = match self {
            GuildError::Internal(_) | GuildError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string() // Don't leak details
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type GuildResult<T> = Result<T, GuildError>;
