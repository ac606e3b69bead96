// Sync job bookkeeping — shared status for HTTP-triggered and timed runs.
//
// Both POST /api/sync and the periodic timer go through `run_tracked`, so
// GET /api/sync/status sees one consistent picture. Overlapping runs are
// allowed: the merge is idempotent and the snapshot table's unique constraint
// keeps history at one row per account per day.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::sync::{SyncError, SyncReport, SyncTarget, Syncer};

/// Live status of sync runs in this process, exposed via GET /api/sync/status.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Runs currently in progress. Shared with each run's guard.
    pub in_flight: Arc<AtomicUsize>,
    /// Most recent completed report from this process.
    pub last_report: Option<SyncReport>,
    /// Error from the last run, cleared by the next successful one.
    pub last_error: Option<String>,
    pub last_started_at: Option<DateTime<Utc>>,
}

impl SyncState {
    pub fn running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

/// Counts one run as in flight until dropped, however the run ends.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Run a sync and record its start, outcome and error in `state`.
pub async fn run_tracked(
    syncer: &Syncer,
    state: &RwLock<SyncState>,
    target: SyncTarget,
) -> Result<SyncReport, SyncError> {
    let _guard = {
        let mut s = state.write().await;
        s.last_started_at = Some(Utc::now());
        InFlight::enter(&s.in_flight)
    };

    let result = syncer.run(target).await;

    let mut s = state.write().await;
    match &result {
        // A request for a missing project says nothing about the last sync
        Ok(report) if report.projects.iter().any(|p| p.is_not_found()) => {}
        Ok(report) => {
            s.last_report = Some(report.clone());
            s.last_error = None;
        }
        Err(e) => {
            s.last_error = Some(e.to_string());
        }
    }
    result
}

/// Start a tracked run on its own task. Dropping the handle detaches the
/// run; it still finishes and records its report.
pub fn launch_sync(
    syncer: Arc<Syncer>,
    state: Arc<RwLock<SyncState>>,
    target: SyncTarget,
) -> JoinHandle<Result<SyncReport, SyncError>> {
    tokio::spawn(async move { run_tracked(&syncer, &state, target).await })
}

/// Sync all projects every `period`, starting immediately.
pub fn spawn_periodic_sync(
    syncer: Arc<Syncer>,
    state: Arc<RwLock<SyncState>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // A slow run shouldn't be followed by a burst of catch-up runs
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            info!("Periodic sync starting");
            if let Err(e) = run_tracked(&syncer, &state, SyncTarget::All).await {
                error!(error = %e, "Periodic sync failed");
            }
        }
    })
}
