//! Live Cache server binary
//!
//! Serves the cache over HTTP and streams mutations to observers.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use live_cache::api::{create_router, AppState};
use live_cache::tasks::{CleanupSweep, RefreshScheduler};
use live_cache::Config;

/// Main entry point for the Live Cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create cache store and notification bus, wire them together
/// 4. Start the bus dispatcher, the cleanup sweep and (optionally) the refresh scheduler
/// 5. Serve HTTP and observer connections on the configured port
/// 6. On SIGINT/SIGTERM: stop accepting, stop the schedulers, stop the dispatcher
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "live_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Live Cache Server");

    let config = Config::from_env();
    info!(
        max_entries = config.max_entries,
        default_ttl = config.default_ttl,
        port = config.server_port,
        cleanup_interval = config.cleanup_interval,
        auto_refresh = config.auto_refresh,
        refresh_tick = config.refresh_tick,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config);
    let dispatcher = state
        .bus
        .spawn_dispatcher()
        .context("notification dispatcher already running")?;

    let cleanup = CleanupSweep::new(state.cache.clone(), config.cleanup_interval());
    cleanup.start().await;

    let refresher = RefreshScheduler::new(state.cache.clone(), config.refresh_tick());
    if config.auto_refresh {
        refresher.start().await;
    } else {
        info!("Auto-refresh disabled, scheduler not started");
    }

    let bus = state.bus.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    refresher.stop().await;
    cleanup.stop().await;
    bus.shutdown();
    if let Err(e) = dispatcher.await {
        warn!(error = %e, "Dispatcher ended abnormally");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
