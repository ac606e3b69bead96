// GET /api/sync/status — last report plus project counts.
//
// Prefers the report held in memory by this process; after a restart it
// falls back to the one persisted in sync_state.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::sync::load_last_report;
use crate::web::{api_error, AppState};

pub async fn get_status(State(state): State<AppState>) -> Response {
    let counts = match state.db.count_projects().await {
        Ok(counts) => counts,
        Err(e) => {
            warn!(error = %e, "Failed to count projects");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read project counts");
        }
    };

    let live = state.sync_state.read().await.clone();
    let running = live.running();
    let last_report = match live.last_report {
        Some(report) => Some(report),
        None => load_last_report(state.db.as_ref()).await.unwrap_or_else(|e| {
            warn!(error = %e, "Stored sync report unreadable");
            None
        }),
    };

    Json(serde_json::json!({
        "running": running,
        "last_started_at": live.last_started_at,
        "last_error": live.last_error,
        "last_report": last_report,
        "total_projects": counts.total_projects,
        "active_projects": counts.active_projects,
    }))
    .into_response()
}
