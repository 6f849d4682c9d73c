//! HTTP surface
//!
//! One `Runner` is shared by every request, so identical uploads coalesce
//! onto a single tool execution and repeats are served from its cache.

pub mod error;
pub mod form;
mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use eyre::WrapErr;
use tokio::net::TcpListener;
use zeorun_config::ServerSettings;
use zeorun_runner::{ProcessExecutor, Runner};

pub struct AppState<E: ProcessExecutor> {
    runner: Runner<E>,
}

impl<E: ProcessExecutor> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
        }
    }
}

pub fn router<E: ProcessExecutor>(runner: Runner<E>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/cache/stats", get(handlers::cache_stats::<E>))
        .route("/api/:operation", post(handlers::run_operation::<E>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(AppState { runner })
}

/// Bind and serve until Ctrl-C
pub async fn serve<E: ProcessExecutor>(
    runner: Runner<E>,
    settings: &ServerSettings,
) -> eyre::Result<()> {
    let listener = TcpListener::bind(settings.bind)
        .await
        .wrap_err_with(|| format!("failed to bind {}", settings.bind))?;

    tracing::info!(addr = %settings.bind, "listening");

    axum::serve(listener, router(runner, settings.max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
