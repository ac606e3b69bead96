// GET /api/accounts/{id}/snapshots — an account's daily history, newest first.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct SnapshotsQuery {
    /// Days to return (default 30, max 365)
    pub limit: Option<u32>,
}

pub async fn list_snapshots(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Query(params): Query<SnapshotsQuery>,
) -> Response {
    let limit = params.limit.unwrap_or(30).clamp(1, 365);

    match state.db.list_snapshots(account_id, limit).await {
        Ok(snapshots) => Json(serde_json::json!({
            "account_id": account_id,
            "snapshots": snapshots,
        }))
        .into_response(),
        Err(e) => {
            warn!(account_id, error = %e, "Failed to load snapshots");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load snapshots")
        }
    }
}
