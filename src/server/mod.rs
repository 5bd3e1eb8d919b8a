//! HTTP surface: axum router, shared state, and request handlers.

mod error;
mod handlers;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;

use crate::db::DocumentStore;
use crate::error::Result;
use crate::nlp::Analyzer;

/// Application name reported by the ping endpoint.
pub const APP_NAME: &str = "nlp-legal-analyzer";

/// Shared per-process state handed to every handler.
///
/// The analyzer's models are loaded once and read-only afterwards, so they
/// share freely; the SQLite handle is serialized behind a mutex.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub store: Arc<Mutex<DocumentStore>>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/analyze", post(handlers::analyze))
        .route("/documents", get(handlers::list_documents))
        .route("/documents/{id}", get(handlers::get_document))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
