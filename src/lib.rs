//! ResQNet relief coordination service.
//!
//! People affected by a disaster submit aid requests, volunteers browse and
//! accept them, and organizations assign volunteers while watching a feed of
//! events. Requests live in memory by default or in Redis.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=info RESQNET_SEED_DEMO=true cargo run
//! ```
//!
//! Configuration comes from the environment (and `.env`), see [`config::AppConfig`].

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use errors::{ResqError, ResqResult, ValidationError};

use config::AppConfig;
use state::AppState;

pub async fn start_server() -> ResqResult<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading configuration...");
    let config = AppConfig::from_env()?;
    let address = config.address();

    info!("Initializing state...");
    let state = AppState::new(config).await?;
    let app = routes::router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ResqError::InvalidConfiguration(format!("cannot bind {address}: {e}")))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ResqError::internal_error(e.to_string()))?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
