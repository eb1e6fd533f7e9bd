//! fxrate Server Binary
//!
//! Serves aggregated bank exchange rates over HTTP.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxrate_fx::Registry;
use fxrate_server::{router, AppState, ServerConfig};
use fxrate_sources::{HsbcCn, HsbcHk};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting fxrate server");

    // Load configuration
    let config = ServerConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    // Register the built-in source adapters; each gets its own
    // background refresh task.
    let registry = Arc::new(Registry::with_refresh_interval(config.refresh_interval));
    registry.register(Arc::new(HsbcCn::new()))?;
    registry.register(Arc::new(HsbcHk::new()))?;

    let app = router(AppState {
        registry: Arc::clone(&registry),
    });

    let bind = format!("{}:{}", config.listen_addr, config.listen_port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(
        listen_addr = %config.listen_addr,
        listen_port = %config.listen_port,
        refresh_interval_secs = config.refresh_interval.as_secs(),
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Shutdown signal received");
}
