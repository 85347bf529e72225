//! pairlink-relay binary entry point.
//!
//! Usage:
//! ```bash
//! pairlink-relay --config relay.toml
//! ```

use anyhow::Context;
use pairlink_relay::cleanup::spawn_sweeper;
use pairlink_relay::config::Config;
use pairlink_relay::http;
use pairlink_relay::server::PairRelay;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pairlink_relay=info")),
        )
        .init();

    let config_path = get_config_path();
    let config = if config_path.exists() {
        tracing::info!("loading configuration from {}", config_path.display());
        Config::from_file(&config_path)?
    } else {
        tracing::info!(
            "no configuration file at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    let bind_address = config.server.bind_address.clone();
    let cleanup = config.cleanup.clone();

    let relay = Arc::new(PairRelay::new(config));
    let sweeper = spawn_sweeper(relay.clone(), cleanup);

    http::health::init_start_time();
    let app = http::build_router(relay);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!(
        "pairlink-relay v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        bind_address
    );

    axum::serve(listener, app).await.context("server error")?;

    sweeper.abort();
    Ok(())
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("relay.toml"))
}
