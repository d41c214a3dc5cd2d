//! HTTP API error types.
//!
//! Every failure the wire can see serializes as
//! `{"code": "SOME_CODE", "message": "..."}` with a matching HTTP status.
//!
//! ```text
//!   DomainError ──────► ApiError { code, message } ──► 4xx + JSON body
//!   ValidationError ──► ApiError (VALIDATION_ERROR) ─► 400
//!   DbError::Domain ──► unwrapped to the DomainError mapping
//!   DbError (other) ──► logged, flattened to INTERNAL ─► 500
//! ```
//!
//! Business-rule violations keep their message; persistence faults
//! never leak SQL details past the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use reparto_core::{DomainError, ValidationError};
use reparto_db::DbError;

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error codes the HTTP surface can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Entity doesn't exist (product for a rendition, rendition for a payment)
    NotFound,

    /// Malformed body or field-level validation failure
    ValidationError,

    /// Stock cannot cover the requested decrement
    InsufficientStock,

    /// Payment exceeds sale amount at creation
    InvalidPayment,

    /// Sold boxes exceed the box-accounting closure
    BoxOverrun,

    /// Client details differ from the bound identity
    ClientIdentityConflict,

    /// Client has an outstanding contrafactura
    ClientDelinquent,

    /// Payment posting amount is zero or negative
    InvalidAmount,

    /// Payment posting amount exceeds the remaining balance
    OverPayment,

    /// Unique constraint hit (e.g. username already taken)
    Duplicate,

    /// Missing, malformed, expired, or revoked credential
    Unauthorized,

    /// Authenticated but lacking the required role
    Forbidden,

    /// Anything the caller can't fix; details stay in the log
    Internal,
}

impl ErrorCode {
    /// HTTP status this code maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Duplicate => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

// =============================================================================
// API Error
// =============================================================================

/// API error response payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates the generic internal error. The interesting part belongs
    /// in the log, not on the wire.
    pub fn internal() -> Self {
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Shorthand for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let code = match &err {
            DomainError::ProductNotFound(_) | DomainError::RenditionNotFound(_) => {
                ErrorCode::NotFound
            }
            DomainError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            DomainError::InvalidPayment { .. } => ErrorCode::InvalidPayment,
            DomainError::BoxOverrun { .. } => ErrorCode::BoxOverrun,
            DomainError::ClientIdentityConflict { .. } => ErrorCode::ClientIdentityConflict,
            DomainError::ClientDelinquent { .. } => ErrorCode::ClientDelinquent,
            DomainError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            DomainError::OverPayment { .. } => ErrorCode::OverPayment,
            DomainError::Validation(_) => ErrorCode::ValidationError,
        };

        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(domain) => domain.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} is already taken: {}", field, value),
            ),
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
