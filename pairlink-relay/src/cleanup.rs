//! Background sweeper for expired sessions, channels, and PIN tombstones.
//!
//! Runs periodically; lazy per-access checks already keep callers honest,
//! so the sweeper's job is reclaiming memory for entries nobody touches
//! again.

use crate::config::CleanupConfig;
use crate::server::PairRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Spawn the background sweeper task.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_sweeper(
    relay: Arc<PairRelay>,
    config: CleanupConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Sweeper task disabled");
            return;
        }

        let interval_secs = config.interval_secs;
        tracing::info!("Sweeper task started (interval: {}s)", interval_secs);

        let mut timer = interval(Duration::from_secs(interval_secs));

        loop {
            timer.tick().await;

            let stats = relay.sweep();
            if stats.total() > 0 {
                tracing::info!(
                    "Sweep: evicted {} sessions, {} channels, {} tombstones",
                    stats.sessions,
                    stats.channels,
                    stats.tombstones
                );
            } else {
                tracing::debug!("Sweep: nothing to evict");
            }
        }
    })
}
