//! Error handling module for the Book Finder backend.
//!
//! Provides the search error taxonomy with mapping to HTTP status codes and the
//! failure envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const INVALID_QUERY: &str = "INVALID_QUERY";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// User-facing messages. Upstream bodies are never passed through.
pub mod messages {
    pub const QUERY_REQUIRED: &str = "Query parameter is required";
    pub const NETWORK: &str =
        "Unable to connect to the book catalog. Please check your internet connection.";
    pub const FETCH_FAILED: &str = "Failed to fetch books. Please try again later.";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Caller supplied an empty query or bad pagination parameters
    InvalidQuery(String),
    /// The upstream catalog could not be reached
    Network(String),
    /// The upstream catalog answered with a non-success status
    Upstream { status: u16 },
    /// Anything else, e.g. an unparseable upstream body
    Unknown(String),
    /// Malformed request outside of search, e.g. a wishlist body
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AppError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidQuery(_) => codes::INVALID_QUERY,
            AppError::Network(_) => codes::NETWORK_ERROR,
            AppError::Upstream { .. } => codes::UPSTREAM_ERROR,
            AppError::Unknown(_) => codes::UNKNOWN_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the message shown to the caller.
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidQuery(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Network(_) => messages::NETWORK.to_string(),
            AppError::Upstream { .. } | AppError::Unknown(_) => {
                messages::FETCH_FAILED.to_string()
            }
        }
    }

    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AppError::InvalidQuery(_) | AppError::BadRequest(_))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidQuery(msg) | AppError::BadRequest(msg) => {
                write!(f, "{}: {}", self.error_code(), msg)
            }
            AppError::Network(detail) | AppError::Unknown(detail) => {
                write!(f, "{}: {}", self.error_code(), detail)
            }
            AppError::Upstream { status } => {
                write!(f, "{}: upstream returned status {}", self.error_code(), status)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            tracing::error!("Catalog returned status {}", status);
            return AppError::Upstream {
                status: status.as_u16(),
            };
        }
        // Refused, reset, closed mid-response or timed out: the catalog could
        // not be reached in full.
        if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            tracing::error!("Catalog unreachable: {:?}", err);
            return AppError::Network(err.to_string());
        }
        tracing::error!("Catalog request failed: {:?}", err);
        AppError::Unknown(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("Failed to decode catalog response: {:?}", err);
        AppError::Unknown(format!("JSON error: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: error.message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
