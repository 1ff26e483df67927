//! Error types for Ordergate
//!
//! This module provides the error type hierarchy using `thiserror`, plus the
//! mapping from internal errors to HTTP responses at the axum boundary.
//!
//! The webhook boundary depends on this mapping: authenticity and payload
//! failures map to 4xx (Stripe stops retrying once it sees the request itself
//! is bad), while datastore failures map to 5xx so Stripe's redelivery becomes
//! the retry mechanism.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// The main error type for Ordergate operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed inbound request (empty name, non-positive amount, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// Payment processor call failed or was rejected
    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),

    /// Webhook signature verification failed
    #[error("signature verification error: {0}")]
    Signature(#[from] SignatureError),

    /// Event payload was authentic but could not be interpreted
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// No order matches the given identifier
    #[error("order not found: {0}")]
    NotFound(String),

    /// Persistence layer failure
    #[error("datastore error: {0}")]
    Datastore(#[from] sqlx::Error),

    /// Configuration error (missing or malformed environment variables)
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while talking to the payment processor
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("request to processor failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Processor returned a non-success status
    #[error("processor rejected request with status {status}: {message}")]
    Api {
        /// HTTP status returned by the processor
        status: u16,
        /// Error message extracted from the processor response
        message: String,
    },

    /// Processor response could not be decoded
    #[error("unexpected processor response: {0}")]
    Decode(String),

    /// Session was created but carries no redirect URL
    #[error("checkout session {0} has no redirect URL")]
    MissingRedirect(String),
}

/// Errors raised during webhook signature verification
#[derive(Error, Debug)]
pub enum SignatureError {
    /// Signature header absent from the request
    #[error("missing signature header")]
    MissingHeader,

    /// Header present but not in the `t=...,v1=...` format
    #[error("malformed signature header")]
    MalformedHeader,

    /// Timestamp outside the replay tolerance window
    #[error("signature timestamp outside tolerance ({age_secs}s old)")]
    StaleTimestamp {
        /// Age of the signed timestamp in seconds
        age_secs: i64,
    },

    /// Computed signature does not match any provided signature
    #[error("signature mismatch")]
    Mismatch,
}

/// Result type alias for Ordergate operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error from a string
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a not-found error from an identifier
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Error::NotFound(id.into())
    }

    /// HTTP status code this error maps to at the boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Signature(_) => StatusCode::BAD_REQUEST,
            Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Processor(_) => StatusCode::BAD_GATEWAY,
            Error::Datastore(_) | Error::Io(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Signature failures deliberately collapse to a generic message so the
    /// response leaks nothing about which check failed; server-side logs keep
    /// the detail.
    fn public_message(&self) -> String {
        match self {
            Error::Signature(_) => "invalid signature".to_string(),
            Error::Datastore(_) | Error::Io(_) | Error::Config(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = serde_json::json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}
