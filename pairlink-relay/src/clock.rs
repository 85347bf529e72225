//! Expiry policy - pure timestamp arithmetic shared by all stores.
//!
//! Every store checks liveness lazily on access with these functions; the
//! background sweeper uses the same predicate so the two paths can never
//! disagree.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Whether an entry stamped at `stamp` with lifetime `ttl_secs` is expired
/// at `now`.
///
/// An entry is live strictly before `stamp + ttl_secs`. A stamp in the
/// future (clock adjustment) counts as live.
pub fn is_expired(stamp: u64, ttl_secs: u64, now: u64) -> bool {
    now.saturating_sub(stamp) >= ttl_secs
}
