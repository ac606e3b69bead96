// Web server — Axum-based trigger surface for syncs.
//
// All /api/* routes serve JSON. The server also owns the periodic sync
// timer so a long-running deployment keeps metrics fresh without cron.
//
// No auth layer: bind to localhost or put it behind a proxy that has one.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::sync::Syncer;

pub mod handlers;
pub mod sync_job;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub syncer: Arc<Syncer>,
    pub sync_state: Arc<RwLock<sync_job::SyncState>>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, syncer: Arc<Syncer>) -> Self {
        Self {
            db,
            syncer,
            sync_state: Arc::new(RwLock::new(sync_job::SyncState::default())),
        }
    }
}

/// Start the periodic sync (if enabled) and the Axum server, and block
/// until the server exits.
pub async fn run_server(
    config: Config,
    db: Arc<dyn Database>,
    syncer: Arc<Syncer>,
    port: u16,
    bind: &str,
) -> Result<()> {
    let state = AppState::new(db, syncer);

    match config.sync_interval() {
        Some(period) => {
            info!(minutes = config.sync_interval_mins, "Periodic sync enabled");
            sync_job::spawn_periodic_sync(state.syncer.clone(), state.sync_state.clone(), period);
        }
        None => info!("Periodic sync disabled (VIEWTRACK_SYNC_INTERVAL_MINS=0)"),
    }

    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Viewtrack listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sync", post(handlers::sync::trigger_sync))
        .route("/api/sync/status", get(handlers::status::get_status))
        .route(
            "/api/accounts/{id}/snapshots",
            get(handlers::snapshots::list_snapshots),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
