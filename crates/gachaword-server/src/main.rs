//! Gachaword game server.

use gachaword_core::SessionConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod host;
mod protocol;
mod server;

use server::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse address from env or use default
    let addr: SocketAddr = std::env::var("SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;

    let config = SessionConfig::from_vars(
        std::env::var("GACHA_WEIGHTS").ok().as_deref(),
        std::env::var("GACHA_SEED").ok().as_deref(),
    )?;

    info!(
        "Starting Gachaword server ({} weights, seed {:?})...",
        config.weights, config.seed
    );

    let state = Arc::new(ServerState::new(config));

    server::run_server(addr, state).await
}
