//! HTTP surface of the tracker.

mod evidence;
mod handlers;
mod middleware;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{AppConfig, ServerConfig};
use crate::error::Result;
use crate::reconcile::Tracker;

pub use handlers::ApiError;

/// Upper bound for evidence uploads.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub font_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(tracker: Tracker, config: &AppConfig) -> Self {
        Self {
            tracker: Arc::new(tracker),
            font_path: config.font_path.clone(),
            upload_dir: config.upload_dir.clone(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz_handler))
        .route("/api/isms-items", get(handlers::items_handler))
        .route("/api/save-item", post(handlers::save_item_handler))
        .route("/api/statistics", get(handlers::statistics_handler))
        .route("/api/export-pdf", get(handlers::export_pdf_handler))
        .route("/api/export-xlsx", get(handlers::export_xlsx_handler))
        .route(
            "/api/ai/analyze-evidence",
            post(evidence::analyze_evidence_handler)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(from_fn(middleware::cors_middleware))
        .layer(from_fn(middleware::request_log_middleware))
        .with_state(state)
}

/// Binds the listener and serves until SIGINT/SIGTERM.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let tracker = config.app.open_tracker()?;
    let state = AppState::new(tracker, &config.app);
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind).await?;
    info!(bind = %config.bind, "isms-tracker listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let (Ok(mut sigterm), Ok(mut sigint)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
