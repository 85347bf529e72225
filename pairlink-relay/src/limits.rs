//! Rate limiting for pairlink-relay.
//!
//! Two layers: a keyed limiter per PIN (one pairing shouldn't be able to
//! hammer the service) and a direct global limiter capping aggregate
//! throughput. Both use the governor crate's DashMap-backed limiters.

use crate::config::LimitsConfig;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Type alias for a keyed rate limiter using DashMap.
type KeyedLimiter<K> = RateLimiter<
    K,
    dashmap::DashMap<K, InMemoryState>,
    DefaultClock,
    NoOpMiddleware<governor::clock::QuantaInstant>,
>;

/// Type alias for a direct (non-keyed) rate limiter.
type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiters for the relay server.
#[derive(Clone)]
pub struct RateLimits {
    /// Limits requests per PIN, configured via `limits.requests_per_minute`.
    pin_limiter: Arc<KeyedLimiter<String>>,

    /// Global limiter across all callers, configured via
    /// `limits.global_requests_per_second`.
    global_limiter: Arc<DirectLimiter>,
}

impl std::fmt::Debug for RateLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimits")
            .field("pin_limiter", &"KeyedLimiter<String>")
            .field("global_limiter", &"DirectLimiter")
            .finish()
    }
}

impl RateLimits {
    /// Create rate limiters from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configured quotas are zero.
    pub fn new(config: &LimitsConfig) -> Self {
        let per_pin = NonZeroU32::new(config.requests_per_minute)
            .expect("requests_per_minute must be > 0");
        let global = NonZeroU32::new(config.global_requests_per_second)
            .expect("global_requests_per_second must be > 0");

        Self {
            pin_limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_pin))),
            global_limiter: Arc::new(RateLimiter::direct(Quota::per_second(global))),
        }
    }

    /// Check whether a request against this PIN is allowed.
    pub fn check_pin(&self, pin: &str) -> Result<(), RateLimitError> {
        self.pin_limiter
            .check_key(&pin.to_string())
            .map_err(|_| RateLimitError::PinLimitExceeded)
    }

    /// Check the server-wide request rate.
    pub fn check_global(&self) -> Result<(), RateLimitError> {
        self.global_limiter
            .check()
            .map_err(|_| RateLimitError::GlobalLimitExceeded)
    }

    /// Number of tracked PIN keys (for metrics).
    pub fn pin_keys_count(&self) -> usize {
        self.pin_limiter.len()
    }

    /// Evict fully-recharged entries from the keyed limiter.
    ///
    /// Finished pairings leave entries behind in the DashMap; the sweeper
    /// calls this periodically.
    pub fn shrink(&self) {
        self.pin_limiter.retain_recent();
    }
}

/// Rate limit error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// Too many requests against one PIN.
    PinLimitExceeded,
    /// Aggregate request rate exceeded across all callers.
    GlobalLimitExceeded,
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PinLimitExceeded => write!(f, "pin rate limit exceeded"),
            Self::GlobalLimitExceeded => write!(f, "global rate limit exceeded"),
        }
    }
}

impl std::error::Error for RateLimitError {}
