//! Main PairRelay service coordination.
//!
//! PairRelay owns the PIN registry, the signaling session store, and the
//! relay channel store, and keeps them consistent: whenever a session's
//! lifecycle ends (consumption, deletion, TTL) its PIN is retired in the
//! same step. Request handlers call these operations; each one is a single
//! atomic state transition on the entity it touches.

use crate::channels::{ChannelKey, ChannelStore, ReceiveOutcome};
use crate::clock;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::limits::RateLimits;
use crate::registry::PinRegistry;
use crate::signaling::{Session, SessionStore};
use pairlink_types::{Envelope, Pin, SessionId};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
/// Thread-safe via `AtomicU64`.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total sessions created.
    pub sessions_created: AtomicU64,
    /// Total sessions explicitly deleted.
    pub sessions_deleted: AtomicU64,
    /// Total offers posted.
    pub offers_posted: AtomicU64,
    /// Total answers posted.
    pub answers_posted: AtomicU64,
    /// Total answers consumed by their read-once read.
    pub answers_consumed: AtomicU64,
    /// Total relay chunks accepted into buffers.
    pub chunks_buffered: AtomicU64,
    /// Total relay chunks delivered to receivers.
    pub chunks_delivered: AtomicU64,
    /// Total opaque payload bytes accepted.
    pub bytes_buffered: AtomicU64,
    /// Total opaque payload bytes delivered.
    pub bytes_delivered: AtomicU64,
    /// Total rate limit rejections.
    pub rate_limit_hits: AtomicU64,
    /// Total domain errors returned to callers.
    pub errors_total: AtomicU64,
}

/// Counts from one sweeper pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    /// Sessions evicted by TTL.
    pub sessions: usize,
    /// Relay channels evicted by idle TTL.
    pub channels: usize,
    /// PIN tombstones past their grace period.
    pub tombstones: usize,
}

impl SweepStats {
    /// Total entries removed in this pass.
    pub fn total(&self) -> usize {
        self.sessions + self.channels + self.tombstones
    }
}

/// The coordinating service behind every endpoint.
pub struct PairRelay {
    config: Config,
    registry: PinRegistry,
    sessions: SessionStore,
    channels: ChannelStore,
    rate_limits: RateLimits,
    metrics: RelayMetrics,
}

impl PairRelay {
    /// Create a new PairRelay from configuration.
    pub fn new(config: Config) -> Self {
        let registry = PinRegistry::new(
            config.ttl.tombstone_grace_secs,
            config.limits.max_pin_attempts,
        );
        let channels = ChannelStore::new(config.ttl.channel_ttl_secs, &config.limits);
        let rate_limits = RateLimits::new(&config.limits);
        Self {
            config,
            registry,
            sessions: SessionStore::new(),
            channels,
            rate_limits,
            metrics: RelayMetrics::default(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the rate limiters.
    pub fn rate_limits(&self) -> &RateLimits {
        &self.rate_limits
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Number of live signaling sessions.
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Number of live relay channels.
    pub fn live_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of live PIN bindings.
    pub fn live_pins(&self) -> usize {
        self.registry.live_count()
    }

    // ---- Signaling operations ----

    /// Allocate a session with a fresh unique PIN.
    pub fn create_session(&self) -> ApiResult<(SessionId, Pin)> {
        let now = clock::unix_now();
        let id = SessionId::new();
        let pin = self.registry.allocate(id)?;
        self.sessions
            .insert(Arc::new(Session::new(id, pin.clone(), now)));
        self.metrics
            .sessions_created
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        tracing::info!("created session {}", id);
        Ok((id, pin))
    }

    /// Resolve a PIN to its live session id.
    pub fn resolve_pin(&self, pin: &Pin) -> ApiResult<SessionId> {
        let id = self.registry.resolve(pin)?;
        // The binding can outlive the session briefly when expiry hasn't
        // been observed yet; the liveness check retires it on the spot.
        let session = self.live_session(&id)?;
        Ok(session.id())
    }

    /// Post the offer envelope.
    pub fn post_offer(&self, id: &SessionId, envelope: Envelope) -> ApiResult<()> {
        let session = self.live_session(id)?;
        session.post_offer(envelope)?;
        self.metrics
            .offers_posted
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        tracing::debug!("offer posted for session {}", id);
        Ok(())
    }

    /// Read the offer envelope, unchanged.
    pub fn get_offer(&self, id: &SessionId) -> ApiResult<Envelope> {
        let session = self.live_session(id)?;
        session.get_offer()
    }

    /// Post the answer envelope.
    pub fn post_answer(&self, id: &SessionId, envelope: Envelope) -> ApiResult<()> {
        let session = self.live_session(id)?;
        session.post_answer(envelope)?;
        self.metrics
            .answers_posted
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        tracing::debug!("answer posted for session {}", id);
        Ok(())
    }

    /// Destructively read the answer.
    ///
    /// Exactly one concurrent caller wins; the session is torn down and
    /// its PIN retired in the winner's call.
    pub fn take_answer(&self, id: &SessionId) -> ApiResult<Envelope> {
        let session = self.live_session(id)?;
        let envelope = session.take_answer()?;
        let now = clock::unix_now();
        self.sessions.remove(id);
        self.registry.retire(session.pin(), now);
        self.metrics
            .answers_consumed
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        tracing::info!("answer consumed, session {} closed", id);
        Ok(envelope)
    }

    /// Remove a session. Idempotent: deleting an unknown session succeeds.
    pub fn delete_session(&self, id: &SessionId) {
        if let Some(session) = self.sessions.remove(id) {
            self.registry.retire(session.pin(), clock::unix_now());
            self.metrics
                .sessions_deleted
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            tracing::info!("deleted session {}", id);
        }
    }

    /// Look up a live session, evicting it lazily if its TTL elapsed.
    fn live_session(&self, id: &SessionId) -> ApiResult<Arc<Session>> {
        let now = clock::unix_now();
        let session = self.sessions.get(id).ok_or(ApiError::SessionExpired)?;
        if session.is_expired(self.config.ttl.session_ttl_secs, now) {
            self.sessions.remove(id);
            self.registry.retire(session.pin(), now);
            return Err(ApiError::SessionExpired);
        }
        Ok(session)
    }

    // ---- Relay operations ----

    /// Buffer one relay chunk.
    pub fn relay_send(
        &self,
        key: ChannelKey,
        chunk_index: u32,
        total_chunks: u32,
        data: String,
    ) -> ApiResult<()> {
        let bytes = data.len() as u64;
        self.channels
            .send(key, chunk_index, total_chunks, data, clock::unix_now())?;
        self.metrics
            .chunks_buffered
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.metrics
            .bytes_buffered
            .fetch_add(bytes, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }

    /// Poll for the next in-order relay chunk.
    pub fn relay_receive(&self, key: &ChannelKey) -> ReceiveOutcome {
        let outcome = self.channels.receive(key, clock::unix_now());
        if let ReceiveOutcome::Chunk { data, .. } = &outcome {
            self.metrics
                .chunks_delivered
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            self.metrics
                .bytes_delivered
                .fetch_add(data.len() as u64, std::sync::atomic::Ordering::Relaxed);
        }
        outcome
    }

    /// Acknowledge a relay channel.
    pub fn relay_ack(&self, key: &ChannelKey) -> ApiResult<()> {
        self.channels.ack(key, clock::unix_now())
    }

    /// Read a relay channel's acknowledgment flag.
    pub fn relay_ack_status(&self, key: &ChannelKey) -> ApiResult<bool> {
        self.channels.ack_status(key, clock::unix_now())
    }

    // ---- Maintenance ----

    /// One eviction pass over all stores.
    ///
    /// Expired sessions retire their PINs; stale tombstones and idle
    /// channels are dropped; the rate limiter key map is shrunk.
    pub fn sweep(&self) -> SweepStats {
        let now = clock::unix_now();

        let expired = self
            .sessions
            .sweep(self.config.ttl.session_ttl_secs, now);
        for session in &expired {
            self.registry.retire(session.pin(), now);
        }

        let channels = self.channels.sweep(now);
        let tombstones = self.registry.sweep(now);
        self.rate_limits.shrink();

        SweepStats {
            sessions: expired.len(),
            channels,
            tombstones,
        }
    }
}
