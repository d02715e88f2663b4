//! Unified error types for the proxy servers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized.
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    /// A required setting is unset or blank.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A URL setting does not parse.
    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        /// Variable name.
        name: &'static str,
        /// Parse failure.
        source: url::ParseError,
    },
}

/// Generative API proxy errors.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// No credential configured on the server.
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    /// The API answered with a non-success status.
    #[error("generateContent failed with HTTP {status}: {body}")]
    Upstream {
        /// Upstream status code.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// Transport or decoding failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Data store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("store rejected request with HTTP {status}: {body}")]
    Rejected {
        /// Store status code.
        status: u16,
        /// Store response body.
        body: String,
    },

    /// Transport or decoding failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),

    /// Injected failure from the in-memory store.
    #[error("simulated store failure: {0}")]
    Simulated(String),
}

/// Error returned to HTTP callers as `{"error": "..."}`.
///
/// Messages are public; the underlying cause is logged by the handler
/// before one of these is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Caller mistake.
    #[error("{0}")]
    BadRequest(String),

    /// Server or upstream failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn api_error_renders_envelope() {
        let response = ApiError::Internal("Failed to load session data.".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Failed to load session data." }));
    }

    #[test]
    fn missing_setting_names_variable() {
        let err = ConfigError::Missing("SUPABASE_URL");
        assert_eq!(err.to_string(), "SUPABASE_URL is not set");
    }
}
