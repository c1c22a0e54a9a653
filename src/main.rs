//! Dungeon Server - Authoritative turn-based multiplayer dungeon crawler
//!
//! Players connect over plain TCP and exchange newline-delimited commands
//! with a single shared world. Every connection runs on its own task; all
//! world state lives behind one lock inside the game service.

mod app;
mod config;
mod game;
mod lobby;
mod net;
mod util;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::app::AppState;
use crate::config::Config;
use crate::game::Map;
use crate::net::handle_connection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Environment first, then `<port> <map>` from the command line
    let config = Config::from_env()?.with_args(std::env::args().skip(1))?;

    init_tracing(&config.log_level);

    info!("Starting Dungeon Server");

    let map_path = config.map_path()?;
    let map = Map::load(&map_path)?;
    info!(
        path = %map_path.display(),
        name = map.name(),
        rows = map.rows(),
        cols = map.cols(),
        gold_total = map.gold_total(),
        gold_required = map.gold_required(),
        "Map loaded"
    );

    let addr = config.server_addr;
    let state = AppState::new(config, map);

    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let session_id = Uuid::new_v4();
                    info!(session_id = %session_id, peer = %peer, "Connection accepted");
                    tokio::spawn(handle_connection(stream, session_id, state.clone()));
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            },
            _ = &mut shutdown => break,
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
