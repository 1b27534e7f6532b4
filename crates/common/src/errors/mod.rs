//! Error types for citenet
//!
//! Provides a single error enum shared by every crate with:
//! - Distinct variants for the failure modes of graph construction
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling
//!
//! Most of these never reach a caller: malformed records and storage
//! failures are logged where they happen and the surrounding batch keeps
//! going. They exist as values so that the decision is visible at the
//! call site.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,
    MalformedRecord,

    // Resource errors (4xxx)
    NotFound,
    PaperNotFound,

    // Conflict errors (5xxx)
    StaleResponse,

    // Rate limiting (6xxx)
    RateLimited,

    // Storage errors (7xxx)
    StorageFailure,

    // External service errors (8xxx)
    ResourceUnavailable,
    UpstreamError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1003,
            ErrorCode::MalformedRecord => 1005,

            ErrorCode::NotFound => 4001,
            ErrorCode::PaperNotFound => 4002,

            ErrorCode::StaleResponse => 5004,

            ErrorCode::RateLimited => 6001,

            ErrorCode::StorageFailure => 7004,

            ErrorCode::ResourceUnavailable => 8007,
            ErrorCode::UpstreamError => 8001,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// A CSV row or API record is missing a required field
    #[error("Malformed record: {message}")]
    MalformedRecord { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    /// A required CSV or remote document could not be fetched
    #[error("Resource unavailable: {resource}: {message}")]
    ResourceUnavailable { resource: String, message: String },

    /// A newer build superseded the one producing this result
    #[error("Superseded by a newer request")]
    StaleResponse,

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    /// Persisted state could not be read or written
    #[error("Storage failure: {message}")]
    StorageFailure { message: String },

    // External service errors
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a resource that could not be loaded
    pub fn unavailable(resource: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ResourceUnavailable {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::MalformedRecord { .. } => ErrorCode::MalformedRecord,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::ResourceUnavailable { .. } => ErrorCode::ResourceUnavailable,
            AppError::StaleResponse => ErrorCode::StaleResponse,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::StorageFailure { .. } => ErrorCode::StorageFailure,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Csv(_) => ErrorCode::InvalidFormat,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::PaperNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::StaleResponse => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            AppError::MalformedRecord { .. } |
            AppError::Csv(_) => StatusCode::UNPROCESSABLE_ENTITY,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::StorageFailure { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::Upstream { .. } |
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::ResourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Whether the caller should render this as "no data, try again"
    pub fn is_no_data(&self) -> bool {
        matches!(self, AppError::ResourceUnavailable { .. })
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let hint = self
            .is_no_data()
            .then(|| "No data available right now, try again later".to_string());

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                hint,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::StorageFailure {
            message: err.to_string(),
        }
    }
}
