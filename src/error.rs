//! Error taxonomy for the marketplace API.
//!
//! Every operation fails with exactly one of these kinds; there is no local
//! recovery or retry. Each kind carries a stable numeric code (see
//! [`ApiError::code`]) surfaced in the unified response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::gateway::types::ApiResponse;

/// Stable API error codes.
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_INPUT: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;
    pub const AMOUNT_OUT_OF_RANGE: i32 = 1003;
    pub const INACTIVE_OFFER: i32 = 1004;
    pub const INVALID_TRANSITION: i32 = 1005;

    // Auth errors (2xxx)
    pub const UNAUTHENTICATED: i32 = 2001;
    pub const FORBIDDEN: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4090;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not authorized: {0}")]
    Forbidden(&'static str),

    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("offer is not active")]
    InactiveOffer,

    #[error("amount must be between {min} and {max}")]
    AmountOutOfRange { min: Decimal, max: Decimal },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable numeric error code for the response envelope.
    pub fn code(&self) -> i32 {
        match self {
            Self::NotFound(_) => error_codes::NOT_FOUND,
            Self::Forbidden(_) => error_codes::FORBIDDEN,
            Self::Unauthenticated(_) => error_codes::UNAUTHENTICATED,
            Self::Conflict(_) => error_codes::CONFLICT,
            Self::InvalidInput(_) => error_codes::INVALID_INPUT,
            Self::InsufficientFunds => error_codes::INSUFFICIENT_FUNDS,
            Self::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
            Self::InactiveOffer => error_codes::INACTIVE_OFFER,
            Self::AmountOutOfRange { .. } => error_codes::AMOUNT_OUT_OF_RANGE,
            Self::Database(_) | Self::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidInput(_)
            | Self::InsufficientFunds
            | Self::InvalidTransition { .. }
            | Self::InactiveOffer
            | Self::AmountOutOfRange { .. } => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a unique-constraint violation to `Conflict`, pass everything
    /// else through as a database error.
    pub fn from_unique_violation(err: sqlx::Error, conflict_msg: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(conflict_msg.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => tracing::error!("database error: {e}"),
            ApiError::Internal(msg) => tracing::error!("internal error: {msg}"),
            _ => tracing::debug!("request rejected: {self}"),
        }

        let msg = match &self {
            // Storage details stay out of client responses
            ApiError::Database(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ApiResponse::<()>::error(self.code(), msg);
        (self.http_status(), Json(body)).into_response()
    }
}
