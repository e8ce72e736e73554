use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::core::cast::CastError;
use crate::core::documents::StoreError;
use crate::core::generation::GenerationError;
use crate::core::generation::log::LogError;
use crate::core::ledger::LedgerError;

/// Error codes for structured error responses
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const NOT_FOUND: &str = "not_found";
    pub const INSUFFICIENT_CREDITS: &str = "insufficient_credits";
    pub const SNAPSHOT_PENDING: &str = "snapshot_pending";
    pub const UPSTREAM_SYNTHESIS_ERROR: &str = "upstream_synthesis_error";
    pub const PERSISTENCE_ERROR: &str = "persistence_error";
    pub const MISSING_AUTH_HEADER: &str = "missing_auth_header";
    pub const INVALID_AUTH_HEADER: &str = "invalid_auth_header";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request is malformed or refers to unsynthesizable content
    #[error("{0}")]
    Validation(String),

    /// A referenced resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// The principal cannot afford the requested generation
    #[error("Insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: u64, available: i64 },

    /// A conversion was started but its snapshot is not ready yet
    #[error("Conversion snapshot not ready for {0}")]
    SnapshotPending(String),

    /// The synthesis provider failed
    #[error("Speech synthesis failed: {0}")]
    UpstreamSynthesis(String),

    /// Generated audio could not be persisted
    #[error("Artifact persistence failed: {0}")]
    Persistence(String),

    /// Authorization header is missing from request
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// Authorization header format is invalid (not "Bearer {token}")
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The request is not authorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for structured error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => error_codes::VALIDATION_ERROR,
            ApiError::NotFound(_) => error_codes::NOT_FOUND,
            ApiError::InsufficientCredits { .. } => error_codes::INSUFFICIENT_CREDITS,
            ApiError::SnapshotPending(_) => error_codes::SNAPSHOT_PENDING,
            ApiError::UpstreamSynthesis(_) => error_codes::UPSTREAM_SYNTHESIS_ERROR,
            ApiError::Persistence(_) => error_codes::PERSISTENCE_ERROR,
            ApiError::MissingAuthHeader => error_codes::MISSING_AUTH_HEADER,
            ApiError::InvalidAuthHeader => error_codes::INVALID_AUTH_HEADER,
            ApiError::Unauthorized(_) => error_codes::UNAUTHORIZED,
            ApiError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::SnapshotPending(_) => StatusCode::CONFLICT,
            ApiError::UpstreamSynthesis(_) => StatusCode::BAD_GATEWAY,
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingAuthHeader | ApiError::InvalidAuthHeader | ApiError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
        }
    }

    /// Log the error at the appropriate level
    pub fn log(&self) {
        match self {
            // Debug level for expected auth failures (missing/invalid headers)
            ApiError::MissingAuthHeader | ApiError::InvalidAuthHeader => {
                tracing::debug!("{}", self);
            }
            // Warn level for caller-side problems
            ApiError::Validation(_)
            | ApiError::NotFound(_)
            | ApiError::InsufficientCredits { .. }
            | ApiError::SnapshotPending(_)
            | ApiError::Unauthorized(_) => {
                tracing::warn!("{}", self);
            }
            // Error level for system issues
            ApiError::UpstreamSynthesis(_) | ApiError::Persistence(_) | ApiError::Internal(_) => {
                tracing::error!("{}", self);
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log the error
        self.log();

        let status = self.status_code();
        let error_code = self.error_code();
        let error_message = self.to_string();

        // Response format: {"status": "error", "error": code, "message": detail}
        let body = Json(json!({
            "status": "error",
            "error": error_code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Validation(msg) => ApiError::Validation(msg),
            GenerationError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            GenerationError::InsufficientCredits {
                required,
                available,
            } => ApiError::InsufficientCredits {
                required,
                available,
            },
            GenerationError::Synthesis(msg) => ApiError::UpstreamSynthesis(msg),
            GenerationError::SnapshotPending(scope) => ApiError::SnapshotPending(scope),
            GenerationError::Persistence(msg) => ApiError::Persistence(msg),
            GenerationError::Store(e) => ApiError::Internal(e.to_string()),
            GenerationError::Ledger(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CastError> for ApiError {
    fn from(e: CastError) -> Self {
        match e {
            CastError::Validation(msg) => ApiError::Validation(msg),
            CastError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            CastError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(_) => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<LogError> for ApiError {
    fn from(e: LogError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

// Result type alias for convenience
pub type ApiResult<T> = Result<T, ApiError>;
