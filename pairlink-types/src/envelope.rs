//! Envelope - the opaque handshake payload exchanged through a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque encrypted payload wrapper posted as an offer or answer.
///
/// The service never interprets the nonce or ciphertext; envelopes are
/// stored and echoed back byte-for-byte. Field names follow the wire
/// format of the handshake clients.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Envelope format version (currently 1).
    pub v: u32,
    /// The session this envelope was produced for.
    pub session_id: String,
    /// Base64-encoded nonce. Opaque to the service.
    pub nonce_b64: String,
    /// Base64-encoded ciphertext. Opaque to the service.
    pub ct_b64: String,
}

// Ciphertext contents stay out of logs; show lengths only.
impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("v", &self.v)
            .field("session_id", &self.session_id)
            .field("nonce_b64_len", &self.nonce_b64.len())
            .field("ct_b64_len", &self.ct_b64.len())
            .finish()
    }
}
