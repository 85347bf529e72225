//! PIN registry - allocation, resolution, and tombstoning of session PINs.
//!
//! At most one live session holds a given PIN at a time. Once a session
//! ends, its PIN is retired to a tombstone instead of being hard-deleted,
//! so `resolve` can still report `session_expired` for a grace period
//! before falling back to `pin_not_found`.

use crate::clock;
use crate::error::{ApiError, ApiResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pairlink_types::{Pin, SessionId};

/// One registry slot: the PIN is either bound to a live session or retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinSlot {
    /// PIN is bound to a live session.
    Live(SessionId),
    /// PIN belonged to a session whose lifecycle ended at `retired_at`.
    Tombstone {
        /// Unix timestamp of retirement; drives tombstone eviction.
        retired_at: u64,
    },
}

/// Registry mapping PINs to live sessions, with expiry tombstones.
#[derive(Debug)]
pub struct PinRegistry {
    entries: DashMap<Pin, PinSlot>,
    /// How long tombstones remain visible to `resolve`.
    grace_secs: u64,
    /// Bound on random generation retries when the PIN space is congested.
    max_attempts: u32,
}

impl PinRegistry {
    /// Create an empty registry.
    pub fn new(grace_secs: u64, max_attempts: u32) -> Self {
        Self {
            entries: DashMap::new(),
            grace_secs,
            max_attempts,
        }
    }

    /// Allocate a fresh PIN for `session_id`.
    ///
    /// Retries on collision against both live entries and tombstones
    /// (reusing a tombstoned PIN within its grace window would make
    /// `resolve` ambiguous). Claiming goes through the map entry so two
    /// concurrent allocations can never win the same PIN.
    pub fn allocate(&self, session_id: SessionId) -> ApiResult<Pin> {
        for _ in 0..self.max_attempts {
            let pin = Pin::random();
            match self.entries.entry(pin.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(PinSlot::Live(session_id));
                    return Ok(pin);
                }
                Entry::Occupied(_) => continue,
            }
        }
        Err(ApiError::Internal("pin space exhausted".to_string()))
    }

    /// Resolve a PIN to its live session.
    ///
    /// A tombstoned PIN reports `session_expired`; an unknown PIN (or one
    /// whose tombstone has already been swept) reports `pin_not_found`.
    pub fn resolve(&self, pin: &Pin) -> ApiResult<SessionId> {
        match self.entries.get(pin).map(|slot| *slot.value()) {
            Some(PinSlot::Live(id)) => Ok(id),
            Some(PinSlot::Tombstone { .. }) => Err(ApiError::SessionExpired),
            None => Err(ApiError::PinNotFound),
        }
    }

    /// Retire a PIN, replacing its live binding with a tombstone.
    ///
    /// Idempotent: retiring an already-tombstoned or unknown PIN keeps the
    /// earliest retirement time.
    pub fn retire(&self, pin: &Pin, now: u64) {
        if let Some(mut slot) = self.entries.get_mut(pin) {
            if let PinSlot::Live(_) = *slot {
                *slot = PinSlot::Tombstone { retired_at: now };
            }
        }
    }

    /// Drop tombstones older than the grace period.
    ///
    /// Returns the number of tombstones removed.
    pub fn sweep(&self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, slot| match slot {
            PinSlot::Live(_) => true,
            PinSlot::Tombstone { retired_at } => {
                !clock::is_expired(*retired_at, self.grace_secs, now)
            }
        });
        before - self.entries.len()
    }

    /// Number of live PIN bindings.
    pub fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.value(), PinSlot::Live(_)))
            .count()
    }

    /// Total entries including tombstones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
