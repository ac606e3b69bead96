// POST /api/sync — run a sync now and return its report.
//
// The run happens on its own task and the request waits for it. A client
// that hangs up only detaches the run. Returns 200 with the report even
// when accounts or projects failed inside it, 404 when an explicitly
// requested project doesn't exist, and 500 when the local store fails.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::sync::SyncTarget;
use crate::web::sync_job::launch_sync;
use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct SyncParams {
    /// Sync only this project; all active projects when absent.
    pub project_id: Option<i64>,
}

pub async fn trigger_sync(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> Response {
    let target = SyncTarget::from(params.project_id);

    let handle = launch_sync(state.syncer.clone(), state.sync_state.clone(), target);
    let result = match handle.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Sync task panicked");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Sync task failed");
        }
    };

    match result {
        Ok(report) => {
            if let Some(missing) = report.projects.iter().find(|p| p.is_not_found()) {
                let message = missing
                    .error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "project not found".to_string());
                return (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({ "error": message, "report": report })),
                )
                    .into_response();
            }
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Sync run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "kind": "store",
                    "report": null,
                })),
            )
                .into_response()
        }
    }
}
