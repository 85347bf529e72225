//! HTTP endpoints for pairlink-relay.
//!
//! The signaling API under `/v1`, the tagged-action relay endpoint, and
//! the operational endpoints. Handlers receive the shared [`PairRelay`]
//! via an `Extension` layer.

pub mod health;
mod metrics;
mod relay;
mod sessions;

use crate::error::ApiError;
use crate::server::PairRelay;
use axum::{
    routing::{delete, get, post},
    Extension, Router,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
pub fn build_router(relay: Arc<PairRelay>) -> Router {
    Router::new()
        .route("/v1/sessions", post(sessions::create_session))
        .route("/v1/sessions/resolve", get(sessions::resolve_pin))
        .route(
            "/v1/sessions/:id/offer",
            get(sessions::get_offer).post(sessions::post_offer),
        )
        .route(
            "/v1/sessions/:id/answer",
            get(sessions::get_answer).post(sessions::post_answer),
        )
        .route("/v1/sessions/:id", delete(sessions::delete_session))
        .route("/relay", post(relay::handle))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(Extension(relay))
}

/// Count a domain error before it crosses the boundary.
///
/// Rate limit rejections have their own counter; everything else lands in
/// `errors_total`.
pub(crate) fn observed(relay: &PairRelay, err: ApiError) -> ApiError {
    if !matches!(err, ApiError::RateLimited) {
        relay.metrics().errors_total.fetch_add(1, Ordering::Relaxed);
    }
    err
}

/// Global throughput gate applied by every handler.
pub(crate) fn check_global(relay: &PairRelay) -> Result<(), ApiError> {
    relay.rate_limits().check_global().map_err(|e| {
        tracing::warn!("Global rate limit exceeded: {}", e);
        relay
            .metrics()
            .rate_limit_hits
            .fetch_add(1, Ordering::Relaxed);
        ApiError::RateLimited
    })
}

/// Per-PIN gate applied by PIN-addressed handlers.
pub(crate) fn check_pin_rate(relay: &PairRelay, pin: &str) -> Result<(), ApiError> {
    relay.rate_limits().check_pin(pin).map_err(|e| {
        tracing::warn!("Rate limited pin {}: {}", pin, e);
        relay
            .metrics()
            .rate_limit_hits
            .fetch_add(1, Ordering::Relaxed);
        ApiError::RateLimited
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, Response};
    use tower::util::ServiceExt;

    pub fn test_relay() -> Arc<PairRelay> {
        Arc::new(PairRelay::new(Config::default()))
    }

    pub fn test_relay_with(config: Config) -> Arc<PairRelay> {
        Arc::new(PairRelay::new(config))
    }

    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response<axum::body::Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
