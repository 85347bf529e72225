//! Error types for pairlink-relay.
//!
//! Domain errors are expected, recoverable outcomes and cross the HTTP
//! boundary as a status code plus a machine-readable `{"error": code}`
//! body. Only [`ApiError::Internal`] represents an unexpected fault and
//! gets logged at error level.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Domain errors surfaced by session and relay operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No session, live or tombstoned, matches this PIN.
    #[error("pin not found")]
    PinNotFound,

    /// The entity existed but its lifecycle has ended (TTL, deletion, or
    /// destructive consumption of the answer).
    #[error("session expired")]
    SessionExpired,

    /// Reading the offer before it was posted.
    #[error("offer not set")]
    OfferNotSet,

    /// Posting an answer before the offer was posted. Same wire code as
    /// [`ApiError::OfferNotSet`] but a conflict, not a missing resource.
    #[error("offer required before answer")]
    OfferRequired,

    /// Posting a second offer on the same session.
    #[error("offer already set")]
    OfferAlreadySet,

    /// Posting a second answer on the same session.
    #[error("answer already set")]
    AnswerAlreadySet,

    /// Reading the answer before it was posted.
    #[error("answer not set")]
    AnswerNotSet,

    /// Malformed input: bad PIN format, invalid session id, missing or
    /// oversized fields.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Too many requests.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Unexpected internal fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PinNotFound => StatusCode::NOT_FOUND,
            ApiError::SessionExpired => StatusCode::GONE,
            ApiError::OfferNotSet => StatusCode::NOT_FOUND,
            ApiError::OfferRequired => StatusCode::CONFLICT,
            ApiError::OfferAlreadySet => StatusCode::CONFLICT,
            ApiError::AnswerAlreadySet => StatusCode::CONFLICT,
            ApiError::AnswerNotSet => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The machine-readable error code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::PinNotFound => "pin_not_found",
            ApiError::SessionExpired => "session_expired",
            ApiError::OfferNotSet | ApiError::OfferRequired => "offer_not_set",
            ApiError::OfferAlreadySet => "offer_already_set",
            ApiError::AnswerAlreadySet => "answer_already_set",
            ApiError::AnswerNotSet => "answer_not_set",
            ApiError::Validation(_) => "validation",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(reason) = &self {
            tracing::error!("internal error: {}", reason);
        }
        (self.status(), Json(json!({ "error": self.code() }))).into_response()
    }
}

/// Result type alias for relay operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
