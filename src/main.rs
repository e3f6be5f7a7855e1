//! Scope3 Proxy - a read-through caching proxy for emissions measurements
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration (JSON file for the environment, then env vars)
//! 3. Build the cache, upstream client and emission service
//! 4. Create the Axum router
//! 5. Serve until SIGINT/SIGTERM, then drain within the configured window

use std::net::SocketAddr;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scope3_proxy::api::{create_router, AppState};
use scope3_proxy::config::Config;

#[tokio::main]
async fn main() {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scope3_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string());
    info!(environment = %environment, "Starting Scope3 emissions caching proxy");

    let config = Config::load(&environment);
    info!(
        port = config.port,
        upstream = %config.scope3.host,
        cache_capacity = config.cache.capacity,
        emission_ttl_minutes = config.cache.emission_ttl_in_minutes,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).expect("invalid configuration");
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("Server listening on http://{}", addr);

    // The server runs on its own task so the signal wait below does not
    // block it; the oneshot starts the drain.
    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = drain_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = drain_tx.send(());

    let drain_window = config.graceful_shutdown_timeout();
    match tokio::time::timeout(drain_window, server).await {
        Ok(Ok(Ok(()))) => info!("Server shutdown complete"),
        Ok(Ok(Err(err))) => error!(error = %err, "Server exited with error"),
        Ok(Err(err)) => error!(error = %err, "Server task failed"),
        Err(_) => warn!(
            "In-flight requests did not drain within {:?}; exiting anyway",
            drain_window
        ),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
