// Main entry point - Configuration, logging and server setup
use std::net::SocketAddr;

use anyhow::Context;
use energy_dashboard::build_state;
use energy_dashboard::infrastructure::config::load_config;
use energy_dashboard::presentation::routes::router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,energy_dashboard=debug,tower_http=info")),
        )
        .init();

    let config = load_config()?;
    if config.influx.token.is_empty() {
        tracing::warn!("No InfluxDB token configured; queries will likely be rejected");
    }

    let state = build_state(&config)?;
    let app = router(state);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?;
    tracing::info!(
        "Starting energy-dashboard on {} ({:?})",
        addr,
        config.server.environment
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
