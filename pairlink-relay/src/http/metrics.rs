//! Prometheus metrics endpoint.

use crate::server::PairRelay;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
/// Includes both gauges (current state) and counters (monotonic since startup).
pub async fn metrics_handler(Extension(relay): Extension<Arc<PairRelay>>) -> impl IntoResponse {
    let m = relay.metrics();

    // Gauges
    let sessions = relay.live_sessions();
    let channels = relay.live_channels();
    let pins = relay.live_pins();

    // Counters
    let sessions_created = m.sessions_created.load(Ordering::Relaxed);
    let sessions_deleted = m.sessions_deleted.load(Ordering::Relaxed);
    let offers_posted = m.offers_posted.load(Ordering::Relaxed);
    let answers_posted = m.answers_posted.load(Ordering::Relaxed);
    let answers_consumed = m.answers_consumed.load(Ordering::Relaxed);
    let chunks_buffered = m.chunks_buffered.load(Ordering::Relaxed);
    let chunks_delivered = m.chunks_delivered.load(Ordering::Relaxed);
    let bytes_buffered = m.bytes_buffered.load(Ordering::Relaxed);
    let bytes_delivered = m.bytes_delivered.load(Ordering::Relaxed);
    let rate_limits = m.rate_limit_hits.load(Ordering::Relaxed);
    let errors = m.errors_total.load(Ordering::Relaxed);

    let body = format!(
        r#"# HELP pairlink_relay_sessions_active Number of live signaling sessions
# TYPE pairlink_relay_sessions_active gauge
pairlink_relay_sessions_active {sessions}

# HELP pairlink_relay_channels_active Number of live relay channels
# TYPE pairlink_relay_channels_active gauge
pairlink_relay_channels_active {channels}

# HELP pairlink_relay_pins_active Number of PINs bound to live sessions
# TYPE pairlink_relay_pins_active gauge
pairlink_relay_pins_active {pins}

# HELP pairlink_relay_info Server information
# TYPE pairlink_relay_info gauge
pairlink_relay_info{{version="{version}"}} 1

# HELP pairlink_relay_sessions_created_total Total sessions created
# TYPE pairlink_relay_sessions_created_total counter
pairlink_relay_sessions_created_total {sessions_created}

# HELP pairlink_relay_sessions_deleted_total Total sessions deleted by their owners
# TYPE pairlink_relay_sessions_deleted_total counter
pairlink_relay_sessions_deleted_total {sessions_deleted}

# HELP pairlink_relay_offers_posted_total Total offers accepted
# TYPE pairlink_relay_offers_posted_total counter
pairlink_relay_offers_posted_total {offers_posted}

# HELP pairlink_relay_answers_posted_total Total answers accepted
# TYPE pairlink_relay_answers_posted_total counter
pairlink_relay_answers_posted_total {answers_posted}

# HELP pairlink_relay_answers_consumed_total Total answers delivered via the read-once fetch
# TYPE pairlink_relay_answers_consumed_total counter
pairlink_relay_answers_consumed_total {answers_consumed}

# HELP pairlink_relay_chunks_buffered_total Total relay chunks accepted for buffering
# TYPE pairlink_relay_chunks_buffered_total counter
pairlink_relay_chunks_buffered_total {chunks_buffered}

# HELP pairlink_relay_chunks_delivered_total Total relay chunks delivered to receivers
# TYPE pairlink_relay_chunks_delivered_total counter
pairlink_relay_chunks_delivered_total {chunks_delivered}

# HELP pairlink_relay_bytes_buffered_total Total chunk payload bytes accepted
# TYPE pairlink_relay_bytes_buffered_total counter
pairlink_relay_bytes_buffered_total {bytes_buffered}

# HELP pairlink_relay_bytes_delivered_total Total chunk payload bytes delivered
# TYPE pairlink_relay_bytes_delivered_total counter
pairlink_relay_bytes_delivered_total {bytes_delivered}

# HELP pairlink_relay_rate_limit_hits_total Total rate limit rejections
# TYPE pairlink_relay_rate_limit_hits_total counter
pairlink_relay_rate_limit_hits_total {rate_limits}

# HELP pairlink_relay_errors_total Total request errors
# TYPE pairlink_relay_errors_total counter
pairlink_relay_errors_total {errors}
"#,
        version = env!("CARGO_PKG_VERSION"),
    );

    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
