//! # pairlink-types
//!
//! Wire format types for the pairlink ephemeral pairing and relay service.
//!
//! This crate provides the foundational types used across all pairlink crates:
//! - [`SessionId`], [`Pin`] - Identity types for signaling sessions
//! - [`Envelope`] - Opaque handshake payload wrapper (never decoded)
//! - [`RelayRequest`] and its response types - The tagged relay actions
//! - [`ParseError`] - Validation errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod ids;
mod relay;

pub use envelope::Envelope;
pub use error::ParseError;
pub use ids::{Pin, SessionId};
pub use relay::{
    AckResponse, AckStatusResponse, Chunk, ReceiveResponse, ReceiveStatus, RelayRequest,
    SendResponse, SendStatus,
};
