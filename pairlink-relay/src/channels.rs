//! Relay channel store - ordered chunk buffers keyed by (PIN, partition key).
//!
//! A channel is created implicitly by the first `send` and destroyed only
//! by idle TTL. Chunks arrive in any order but are delivered strictly by
//! index; every call is one atomic check-and-transition under the
//! channel's own mutex, so unrelated channels never contend.

use crate::clock;
use crate::config::LimitsConfig;
use crate::error::{ApiError, ApiResult};
use dashmap::DashMap;
use pairlink_types::Pin;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Composite key isolating one logical channel.
///
/// Two directions of the same PIN use different partition keys and are
/// wholly independent: chunks, cursor, and acknowledgment never leak
/// between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    /// Human-memorable PIN namespace.
    pub pin: Pin,
    /// Caller-supplied partition key (e.g. a password hash); never
    /// interpreted, only compared.
    pub partition: String,
}

impl ChannelKey {
    /// Build a key from its parts.
    pub fn new(pin: Pin, partition: impl Into<String>) -> Self {
        Self {
            pin,
            partition: partition.into(),
        }
    }
}

/// Outcome of one `receive` poll, in evaluation precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// No channel exists for this key (never created, or evicted).
    Expired,
    /// All declared chunks were delivered on earlier polls.
    Done,
    /// The chunk at the cursor; the cursor has advanced past it.
    Chunk {
        /// Index of the delivered chunk.
        index: u32,
        /// Opaque payload, echoed unchanged.
        data: String,
    },
    /// The next in-order chunk has not arrived yet.
    Waiting,
}

/// One direction of a transfer: the buffered chunks plus delivery state.
#[derive(Debug)]
struct Channel {
    /// Out-of-order arrivals keyed by index; delivered chunks are removed.
    chunks: BTreeMap<u32, String>,
    /// Chunk count declared by the sender; fixed for the channel lifetime.
    total_chunks: u32,
    /// Index of the next chunk to deliver.
    cursor: u32,
    /// Set by an explicit `ack` call; independent of completion.
    acknowledged: bool,
    /// Unix timestamp of the last send/receive/ack; drives idle TTL.
    last_activity: u64,
}

impl Channel {
    fn new(total_chunks: u32, now: u64) -> Self {
        Self {
            chunks: BTreeMap::new(),
            total_chunks,
            cursor: 0,
            acknowledged: false,
            last_activity: now,
        }
    }

    fn is_expired(&self, ttl_secs: u64, now: u64) -> bool {
        clock::is_expired(self.last_activity, ttl_secs, now)
    }
}

/// Process-wide store of relay channels.
#[derive(Debug)]
pub struct ChannelStore {
    channels: DashMap<ChannelKey, Arc<Mutex<Channel>>>,
    ttl_secs: u64,
    max_chunk_bytes: usize,
    max_total_chunks: u32,
}

impl ChannelStore {
    /// Create an empty store with the given idle TTL and payload limits.
    pub fn new(ttl_secs: u64, limits: &LimitsConfig) -> Self {
        Self {
            channels: DashMap::new(),
            ttl_secs,
            max_chunk_bytes: limits.max_chunk_bytes,
            max_total_chunks: limits.max_total_chunks,
        }
    }

    /// Buffer one chunk, creating the channel on first send.
    ///
    /// Always reports `waiting` to the caller; only `receive` observes
    /// completion. Re-sending an index overwrites the buffered payload
    /// (retries are harmless). A send to an idle-expired channel starts a
    /// fresh transfer in place.
    pub fn send(
        &self,
        key: ChannelKey,
        chunk_index: u32,
        total_chunks: u32,
        data: String,
        now: u64,
    ) -> ApiResult<()> {
        if total_chunks == 0 {
            return Err(ApiError::Validation("totalChunks must be positive".into()));
        }
        if total_chunks > self.max_total_chunks {
            return Err(ApiError::Validation(format!(
                "totalChunks {} exceeds limit {}",
                total_chunks, self.max_total_chunks
            )));
        }
        if chunk_index >= total_chunks {
            return Err(ApiError::Validation(format!(
                "chunkIndex {} out of range for {} chunks",
                chunk_index, total_chunks
            )));
        }
        if data.len() > self.max_chunk_bytes {
            return Err(ApiError::Validation(format!(
                "chunk of {} bytes exceeds limit {}",
                data.len(),
                self.max_chunk_bytes
            )));
        }

        // Mutate while still holding the map entry so a concurrent eviction
        // cannot orphan the reset channel between our expiry check and the
        // insert. Lock order is always map entry first, channel second.
        let entry = self
            .channels
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Channel::new(total_chunks, now))));

        let mut ch = entry.lock().expect("channel lock poisoned");
        if ch.is_expired(self.ttl_secs, now) {
            *ch = Channel::new(total_chunks, now);
        }
        if ch.total_chunks != total_chunks {
            return Err(ApiError::Validation(format!(
                "totalChunks changed from {} to {}",
                ch.total_chunks, total_chunks
            )));
        }
        ch.chunks.insert(chunk_index, data);
        ch.last_activity = now;
        Ok(())
    }

    /// Poll for the next in-order chunk.
    ///
    /// Outcome precedence: no channel → `Expired`; cursor at total →
    /// `Done`; chunk at cursor present → `Chunk` (advances the cursor by
    /// exactly one); otherwise `Waiting`. Never blocks.
    pub fn receive(&self, key: &ChannelKey, now: u64) -> ReceiveOutcome {
        if self.evict_if_expired(key, now) {
            return ReceiveOutcome::Expired;
        }
        let Some(channel) = self.channels.get(key).map(|e| e.value().clone()) else {
            return ReceiveOutcome::Expired;
        };

        let mut ch = channel.lock().expect("channel lock poisoned");
        ch.last_activity = now;
        if ch.cursor == ch.total_chunks {
            return ReceiveOutcome::Done;
        }
        let cursor = ch.cursor;
        match ch.chunks.remove(&cursor) {
            Some(data) => {
                let index = cursor;
                ch.cursor += 1;
                ReceiveOutcome::Chunk { index, data }
            }
            None => ReceiveOutcome::Waiting,
        }
    }

    /// Mark the channel acknowledged.
    ///
    /// Valid whenever the channel exists, including after `Done`; it never
    /// evicts a completed channel.
    pub fn ack(&self, key: &ChannelKey, now: u64) -> ApiResult<()> {
        let channel = self.live(key, now)?;
        let mut ch = channel.lock().expect("channel lock poisoned");
        ch.acknowledged = true;
        ch.last_activity = now;
        Ok(())
    }

    /// Read the acknowledgment flag.
    ///
    /// A pure read: polling the flag does not count as activity and never
    /// refreshes the idle TTL.
    pub fn ack_status(&self, key: &ChannelKey, now: u64) -> ApiResult<bool> {
        let channel = self.live(key, now)?;
        let ch = channel.lock().expect("channel lock poisoned");
        Ok(ch.acknowledged)
    }

    fn live(&self, key: &ChannelKey, now: u64) -> ApiResult<Arc<Mutex<Channel>>> {
        if self.evict_if_expired(key, now) {
            return Err(ApiError::SessionExpired);
        }
        self.channels
            .get(key)
            .map(|e| e.value().clone())
            .ok_or(ApiError::SessionExpired)
    }

    /// Remove the entry iff it is still expired, in one step under the map
    /// guard. A concurrent `send` that already reset the channel in place
    /// flips the expiry check and the entry stays.
    fn evict_if_expired(&self, key: &ChannelKey, now: u64) -> bool {
        self.channels
            .remove_if(key, |_, channel| {
                let ch = channel.lock().expect("channel lock poisoned");
                ch.is_expired(self.ttl_secs, now)
            })
            .is_some()
    }

    /// Evict channels whose idle TTL has elapsed.
    ///
    /// Returns the number of channels removed.
    pub fn sweep(&self, now: u64) -> usize {
        let before = self.channels.len();
        self.channels.retain(|_, channel| {
            let ch = channel.lock().expect("channel lock poisoned");
            !ch.is_expired(self.ttl_secs, now)
        });
        before - self.channels.len()
    }

    /// Number of channels currently held.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
