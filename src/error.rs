//! Error types for image-dl
//!
//! This module provides the error handling surface for the library, including:
//! - Domain-specific error types (Fetch, Store, Database, etc.)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for image-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for image-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "scan_interval_secs")
        key: Option<String>,
    },

    /// Client-supplied input was rejected before a record was created
    #[error("validation error: {0}")]
    Validation(String),

    /// Record not found
    #[error("image not found: {0}")]
    NotFound(crate::types::ImageId),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Transport failure while retrieving an image (recoverable per record)
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Blob storage failure (recoverable per record)
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error outside a classified fetch attempt
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new submissions
    #[error("shutdown in progress: not accepting new submissions")]
    ShuttingDown,
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Transport failure classification for a single fetch attempt
///
/// Every variant is recoverable at the pipeline level: the record stays
/// pending and is retried on the next scan cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or DNS resolution failure
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// The request timed out before the response completed
    #[error("fetch timed out after {timeout_secs}s")]
    Timeout {
        /// The timeout budget that was exceeded
        timeout_secs: u64,
    },

    /// The source answered with a non-2xx status
    #[error("source returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code returned by the source
        status: u16,
    },

    /// The transfer failed after the response started
    #[error("stream error mid-transfer: {0}")]
    Stream(String),

    /// The payload exceeded the configured size cap
    #[error("payload exceeds configured limit of {limit} bytes")]
    TooLarge {
        /// The configured maximum payload size
        limit: u64,
    },
}

impl FetchError {
    /// Classify a reqwest error into the fetch taxonomy
    pub(crate) fn classify(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { timeout_secs }
        } else if err.is_connect() {
            FetchError::Unreachable(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus {
                status: status.as_u16(),
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Stream(err.to_string())
        } else {
            FetchError::Unreachable(err.to_string())
        }
    }
}

/// Blob storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to write the byte stream to the sink
    #[error("failed to write blob: {0}")]
    WriteFailed(String),

    /// Failed to publish the blob under its final key
    #[error("failed to publish blob {key}: {reason}")]
    PublishFailed {
        /// The key the blob was being published under
        key: String,
        /// The reason publication failed
        reason: String,
    },

    /// The incoming stream failed before the blob was complete
    #[error("source stream failed: {0}")]
    SourceStream(#[from] FetchError),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs: a machine-readable code,
/// a human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "image 123 not found",
///     "details": {
///       "image_id": 123
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Store(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - upstream source errors
            Error::Fetch(_) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Config { .. } => "config_error",
            Error::NotFound(_) => "not_found",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Fetch(e) => match e {
                FetchError::Unreachable(_) => "source_unreachable",
                FetchError::Timeout { .. } => "fetch_timeout",
                FetchError::HttpStatus { .. } => "source_http_error",
                FetchError::Stream(_) => "stream_error",
                FetchError::TooLarge { .. } => "payload_too_large",
            },
            Error::Store(_) => "store_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::NotFound(id) => Some(serde_json::json!({
                "image_id": id.0,
            })),
            Error::Fetch(FetchError::HttpStatus { status }) => Some(serde_json::json!({
                "upstream_status": status,
            })),
            Error::Fetch(FetchError::TooLarge { limit }) => Some(serde_json::json!({
                "limit_bytes": limit,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
