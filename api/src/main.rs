// ./api/src/main.rs
mod config;
mod error;
mod health;
mod items;
mod posts;
mod routes;

use application::ApplicationError;
use config::ApiConfig;
use routes::{AppState, build_router};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Failures that stop the server before or while it serves.
#[derive(Error, Debug)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] envy::Error),

    #[error("Storage initialization failed: {0}")]
    Storage(#[from] ApplicationError),

    #[error("Failed to bind to address {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = ApiConfig::from_env()?;
    info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Configuration loaded."
    );

    // --- Dependency Injection ---
    let state = AppState::from_config(&config).await?;
    let app = build_router(state);
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server starting on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(StartupError::Serve)
}
