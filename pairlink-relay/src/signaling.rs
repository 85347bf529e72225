//! Signaling session store - the offer/answer state machine.
//!
//! Each session holds one offer slot and one answer slot. The answer is a
//! destructive read: the first successful `take_answer` consumes the
//! session, and every later operation sees `session_expired`. All slot
//! transitions happen under the session's own mutex, so the read-once rule
//! is race-free without any store-wide lock.

use crate::clock;
use crate::error::{ApiError, ApiResult};
use dashmap::DashMap;
use pairlink_types::{Envelope, Pin, SessionId};
use std::sync::{Arc, Mutex};

/// Handshake phase of a session.
///
/// `open → offer-set → answered → consumed`; expiry and deletion are
/// handled by removal from the store, not by a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Freshly created, no envelope posted yet.
    Open,
    /// Offer posted, waiting for the answer.
    OfferSet,
    /// Answer posted, waiting for the one read that consumes it.
    Answered,
    /// Answer was read; terminal.
    Consumed,
}

/// Mutable slot state, guarded by the session mutex.
#[derive(Debug)]
struct Slots {
    phase: Phase,
    offer: Option<Envelope>,
    answer: Option<Envelope>,
}

/// A signaling session: immutable identity plus lock-guarded slots.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    pin: Pin,
    created_at: u64,
    slots: Mutex<Slots>,
}

impl Session {
    /// Create a fresh session in the `open` phase.
    pub fn new(id: SessionId, pin: Pin, created_at: u64) -> Self {
        Self {
            id,
            pin,
            created_at,
            slots: Mutex::new(Slots {
                phase: Phase::Open,
                offer: None,
                answer: None,
            }),
        }
    }

    /// The session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The PIN bound to this session.
    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    /// Whether the session's TTL has elapsed at `now`.
    pub fn is_expired(&self, ttl_secs: u64, now: u64) -> bool {
        clock::is_expired(self.created_at, ttl_secs, now)
    }

    /// Current phase (primarily for tests and metrics).
    pub fn phase(&self) -> Phase {
        self.slots.lock().expect("session lock poisoned").phase
    }

    /// Set the offer. Valid only once, from the `open` phase.
    pub fn post_offer(&self, envelope: Envelope) -> ApiResult<()> {
        let mut slots = self.slots.lock().expect("session lock poisoned");
        match slots.phase {
            Phase::Open => {
                slots.offer = Some(envelope);
                slots.phase = Phase::OfferSet;
                Ok(())
            }
            Phase::OfferSet | Phase::Answered => Err(ApiError::OfferAlreadySet),
            Phase::Consumed => Err(ApiError::SessionExpired),
        }
    }

    /// Read the offer, unchanged. Non-destructive.
    pub fn get_offer(&self) -> ApiResult<Envelope> {
        let slots = self.slots.lock().expect("session lock poisoned");
        if slots.phase == Phase::Consumed {
            return Err(ApiError::SessionExpired);
        }
        slots.offer.clone().ok_or(ApiError::OfferNotSet)
    }

    /// Set the answer. Requires the offer to be set first.
    pub fn post_answer(&self, envelope: Envelope) -> ApiResult<()> {
        let mut slots = self.slots.lock().expect("session lock poisoned");
        match slots.phase {
            Phase::Open => Err(ApiError::OfferRequired),
            Phase::OfferSet => {
                slots.answer = Some(envelope);
                slots.phase = Phase::Answered;
                Ok(())
            }
            Phase::Answered => Err(ApiError::AnswerAlreadySet),
            Phase::Consumed => Err(ApiError::SessionExpired),
        }
    }

    /// Destructively read the answer.
    ///
    /// The phase check and the transition to `consumed` happen under one
    /// lock acquisition, so concurrent callers get exactly one winner.
    pub fn take_answer(&self) -> ApiResult<Envelope> {
        let mut slots = self.slots.lock().expect("session lock poisoned");
        match slots.phase {
            Phase::Answered => {
                let envelope = slots.answer.take().ok_or_else(|| {
                    ApiError::Internal("answered session without answer slot".to_string())
                })?;
                slots.phase = Phase::Consumed;
                Ok(envelope)
            }
            Phase::Open | Phase::OfferSet => Err(ApiError::AnswerNotSet),
            Phase::Consumed => Err(ApiError::SessionExpired),
        }
    }
}

/// Process-wide store of live sessions, keyed by id.
///
/// Expiry is lazy on access plus the periodic sweep; consumed and deleted
/// sessions are removed eagerly. PIN retirement is the caller's job (the
/// coordinating service owns the registry).
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created session.
    pub fn insert(&self, session: Arc<Session>) {
        self.sessions.insert(session.id(), session);
    }

    /// Look up a session by id, without an expiry check.
    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    /// Remove a session, returning it if it was present.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    /// Remove every session whose TTL has elapsed, returning them so the
    /// caller can retire their PINs.
    pub fn sweep(&self, ttl_secs: u64, now: u64) -> Vec<Arc<Session>> {
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|e| e.value().is_expired(ttl_secs, now))
            .map(|e| *e.key())
            .collect();

        expired
            .iter()
            .filter_map(|id| self.remove(id))
            .collect()
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
