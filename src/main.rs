//! Forum shield binary.
//!
//! Loads configuration, wires the check engines, and serves until
//! interrupted. Pass a TOML config path as the first argument; defaults
//! apply otherwise.

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forum_shield::config::loader::load_config;
use forum_shield::signature::MemoryNonceStore;
use forum_shield::{ShieldConfig, ShieldServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forum_shield=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("forum-shield v0.1.0 starting");

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => ShieldConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        signature_enabled = config.signature.enabled,
        rate_limit_enabled = config.rate_limit.enabled,
        content_enabled = config.content.enabled,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            forum_shield::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = ShieldServer::new(config, Arc::new(MemoryNonceStore::new()))?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
