//! Parse and validation errors for pairlink wire types.

use thiserror::Error;

/// Errors produced while parsing wire-level identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The PIN is not exactly six ASCII digits.
    #[error("invalid pin: expected 6 digits, got {0:?}")]
    InvalidPin(String),

    /// The session id is not a valid UUID.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}
