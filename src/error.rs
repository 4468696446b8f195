//! Error types for the routing service
//!
//! Store errors are absorbed by the compute cache, tool errors propagate to
//! the handlers, and everything that reaches HTTP goes through [`AppError`].

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error ==
/// Failure reaching or decoding from the key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store call exceeded its time budget
    #[error("Store operation timed out after {0}ms")]
    Timeout(u64),

    /// Value could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key or pattern rejected by the store
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

// == Auth Error ==
/// Reasons a bearer token is rejected.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token has no subject")]
    MissingSubject,
}

// == Tool Error ==
/// Failure raised while executing a tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TimedOut(#[from] ComputeTimeout),
}

// == Compute Timeout ==
/// A cache-aside computation ran past its time budget.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Computation timed out after {0}ms")]
pub struct ComputeTimeout(pub u64);

// == Metrics Error ==
/// Failure registering or encoding Prometheus metrics.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Result type for metrics operations.
pub type MetricsResult<T> = std::result::Result<T, MetricsError>;

// == App Error Enum ==
/// Unified error type for the HTTP layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller identity could not be established
    #[error("Could not validate credentials")]
    Unauthenticated(#[from] AuthError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Feature flag is off for this caller
    #[error("Feature not enabled")]
    FeatureDisabled(String),

    /// Tool execution failed; the public message hides the cause
    #[error("{public}")]
    ToolFailed {
        public: &'static str,
        #[source]
        source: ToolError,
    },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps a tool failure with the message shown to the caller.
    pub fn tool(public: &'static str, source: ToolError) -> Self {
        Self::ToolFailed { public, source }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            AppError::ToolFailed { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
