//! Relay wire messages - the tagged actions of the `/relay` endpoint.

use crate::Pin;
use serde::{Deserialize, Serialize};

/// A relay request, discriminated by the `action` field.
///
/// `passwordHash` is the caller-supplied partition key: two directions of
/// the same PIN stay isolated by using different values. The service never
/// verifies it cryptographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum RelayRequest {
    /// Buffer one chunk at the given index.
    #[serde(rename_all = "camelCase")]
    Send {
        /// Channel PIN.
        pin: Pin,
        /// Partition key isolating this channel under the PIN.
        password_hash: String,
        /// Zero-based index of this chunk.
        chunk_index: u32,
        /// Total number of chunks the sender will transmit.
        total_chunks: u32,
        /// Opaque chunk payload.
        data: String,
    },
    /// Deliver the next in-order chunk, if available.
    #[serde(rename_all = "camelCase")]
    Receive {
        /// Channel PIN.
        pin: Pin,
        /// Partition key isolating this channel under the PIN.
        password_hash: String,
    },
    /// Mark the channel as acknowledged.
    #[serde(rename_all = "camelCase")]
    Ack {
        /// Channel PIN.
        pin: Pin,
        /// Partition key isolating this channel under the PIN.
        password_hash: String,
    },
    /// Query the acknowledgment flag.
    #[serde(rename_all = "camelCase")]
    AckStatus {
        /// Channel PIN.
        pin: Pin,
        /// Partition key isolating this channel under the PIN.
        password_hash: String,
    },
}

impl RelayRequest {
    /// The PIN this request addresses.
    pub fn pin(&self) -> &Pin {
        match self {
            RelayRequest::Send { pin, .. }
            | RelayRequest::Receive { pin, .. }
            | RelayRequest::Ack { pin, .. }
            | RelayRequest::AckStatus { pin, .. } => pin,
        }
    }

    /// The partition key this request addresses.
    pub fn password_hash(&self) -> &str {
        match self {
            RelayRequest::Send { password_hash, .. }
            | RelayRequest::Receive { password_hash, .. }
            | RelayRequest::Ack { password_hash, .. }
            | RelayRequest::AckStatus { password_hash, .. } => password_hash,
        }
    }
}

/// Status of a send: always `waiting`. Only `receive` reports completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SendStatus {
    /// Chunk buffered; sender keeps polling via `receive` on the other side.
    Waiting,
}

/// Response to a `send` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    /// Always [`SendStatus::Waiting`].
    pub status: SendStatus,
}

impl SendResponse {
    /// The canonical send response.
    pub fn waiting() -> Self {
        Self {
            status: SendStatus::Waiting,
        }
    }
}

/// Status of a `receive` poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiveStatus {
    /// No channel exists for this key (never created, or evicted).
    Expired,
    /// All declared chunks were already delivered.
    Done,
    /// The next in-order chunk is included in this response.
    ChunkAvailable,
    /// The channel exists but the next chunk has not arrived yet.
    Waiting,
}

/// One delivered chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Zero-based index of this chunk.
    pub chunk_index: u32,
    /// Opaque chunk payload, echoed unchanged.
    pub data: String,
}

/// Response to a `receive` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveResponse {
    /// Outcome of this poll.
    pub status: ReceiveStatus,
    /// Present only when `status` is `chunkAvailable`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<Chunk>,
}

/// Response to an `ack` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    /// Always true on success.
    pub success: bool,
}

/// Response to an `ack-status` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckStatusResponse {
    /// Whether `ack` has been called on this channel.
    pub acknowledged: bool,
}
