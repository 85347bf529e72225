//! # pairlink-relay
//!
//! Ephemeral pairing and relay server for pairlink.
//!
//! This crate implements a blind, time-bounded mailbox that:
//! - Issues short numeric PINs that resolve to signaling sessions
//! - Holds one offer and one answer envelope per session, with a
//!   read-once rule on the answer
//! - Relays opaque chunked data between two devices, ordered by index
//! - Never inspects payloads (envelopes and chunks are opaque blobs)
//!
//! ## Architecture
//!
//! ```text
//! Device A ──┐                    ┌── Device B
//!            │       HTTP         │
//!            ├───────────────────►│
//!            │                    │
//!        ┌───┴────────────────────┴───┐
//!        │       pairlink-relay       │
//!        │  ┌──────────┐ ┌─────────┐  │
//!        │  │ sessions │ │ channels│  │
//!        │  │ + PINs   │ │ (chunks)│  │
//!        │  └──────────┘ └─────────┘  │
//!        │     in-memory, TTL-swept   │
//!        └────────────────────────────┘
//! ```
//!
//! ## Endpoints
//!
//! - `POST /v1/sessions`, `GET /v1/sessions/resolve?pin=` - PIN issuance
//!   and lookup
//! - `GET|POST /v1/sessions/{id}/offer`, `GET|POST /v1/sessions/{id}/answer`,
//!   `DELETE /v1/sessions/{id}` - the offer/answer handshake slot
//! - `POST /relay` - tagged send/receive/ack/ack-status chunk relay
//! - `GET /health`, `GET /metrics` - operational endpoints

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channels;
pub mod cleanup;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod limits;
pub mod registry;
pub mod server;
pub mod signaling;
