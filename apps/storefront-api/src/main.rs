//! # Lumen Storefront API
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Server                                │
//! │                                                                         │
//! │  Browser ───► HTTP (8080) ───► Routes ───► SQLite                      │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                           Payment processor                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lumen_db::{Database, DbConfig};
use lumen_payments::ProcessorClient;
use lumen_storefront_api::{app, AppState, StorefrontConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lumen=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Lumen storefront API...");

    // Load configuration
    let config = StorefrontConfig::load().context("Invalid configuration")?;
    info!(
        port = config.port,
        database = %config.database_path,
        sandbox = config.payments.sandbox,
        "Configuration loaded"
    );

    // Open database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await
    .context("Failed to open database")?;
    info!("Database ready");

    if config.notification_url().is_none() {
        info!("No public_base_url set; relying on the processor's account-level webhook");
    }

    let gateway = ProcessorClient::new(config.processor_settings())
        .context("Failed to build payment processor client")?;

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(db.clone(), Arc::new(gateway), config));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
