//! yt-server: HTTP API, conversion queue, and background cleanup.
//!
//! This crate ties yt-core and yt-extract together into a running server.
//! It provides:
//!
//! - Axum-based HTTP API with request ids, CORS and per-job SSE streams
//! - A single-worker FIFO [`scheduler::Scheduler`] driving conversions
//! - A periodic cleanup task for old output files and job records
//! - Graceful shutdown via signal handling

pub mod cleanup;
pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod scheduler;
pub mod validate;

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use yt_core::config::Config;
use yt_core::Error;

use crate::context::AppContext;

/// Start the yttmp3 server.
///
/// Builds the extractor and [`AppContext`], spawns the cleanup task and
/// serves HTTP until a shutdown signal is received.
pub async fn start(config: Config) -> yt_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let output_dir = config.output_dir();
    tokio::fs::create_dir_all(&output_dir).await?;
    tracing::info!("Writing conversions to {}", output_dir.display());

    let extractor = yt_extract::build_extractor(&config.execution)?;
    match extractor.health().await {
        Ok(()) => tracing::info!(strategy = extractor.name(), "yt-dlp reachable"),
        Err(e) => tracing::warn!(strategy = extractor.name(), "yt-dlp not reachable yet: {e}"),
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, extractor);
    let cancel = ctx.shutdown.clone();

    let cleanup_ctx = ctx.clone();
    let cleanup_cancel = cancel.clone();
    let cleanup_handle = tokio::spawn(async move {
        cleanup::run_cleanup(cleanup_ctx, cleanup_cancel).await;
    });

    let app = router::build_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    // Signal all background tasks to stop.
    cancel.cancel();
    let _ = cleanup_handle.await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM), then cancel `cancel` so
/// open event streams end and the server can drain.
pub async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
