//! # mofn-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the escrow ledger.
//! Binds to `PORT` (default 8080).

use mofn_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");
    let port = config.port;

    let state = AppState::bootstrap(config).map_err(|e| {
        tracing::error!("Ledger initialization failed: {e}");
        e
    })?;
    tracing::info!(tip = %state.ledger.tip(), "ledger ready");

    let app = mofn_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("M-of-N escrow API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
