//! Relay error taxonomy.
//!
//! Every failure on the request path is surfaced to the immediate caller as
//! `{ "error": string }` with a status code that mirrors the failure. The
//! relays never retry; retry policy belongs to the embedding page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the form, submission and asset relays.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Required configuration (form base URL or parameters) is absent.
    #[error("configuration incomplete: {0}")]
    Configuration(String),

    /// Upstream answered with a non-success status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Connection failure, timeout, DNS failure or a broken body stream.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The inbound request cannot be mapped onto the upstream.
    #[error("{0}")]
    BadRequest(String),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// JSON error payload returned to callers.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl RelayError {
    /// Build an upstream error from the status the form host returned.
    pub fn upstream(status: StatusCode, context: &str) -> Self {
        Self::Upstream {
            status,
            message: format!("{}: {}", context, status.as_u16()),
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_is_500() {
        let err = RelayError::Configuration("FORM_BASE_URL is not set".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "configuration incomplete: FORM_BASE_URL is not set"
        );
    }

    #[test]
    fn test_upstream_error_mirrors_status() {
        let err = RelayError::upstream(StatusCode::NOT_FOUND, "form server error");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "form server error: 404");
    }

    #[tokio::test]
    async fn test_error_renders_json_body() {
        let response = RelayError::BadRequest("empty asset path".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "empty asset path");
    }
}
