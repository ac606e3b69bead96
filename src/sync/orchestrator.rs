// Sync orchestrator — one reconciliation pass over a project or all projects.
//
// Per account: sheet record (or zeros) -> local record -> merge -> write
// back -> today's snapshot. A failing account is counted and skipped, an
// unreadable sheet drops the project to cache-only, and only a failure to
// list projects stops a full run.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::error::{AccountStage, SyncError};
use super::merge::merge;
use super::report::{build_report, ProjectErrorKind, ProjectSyncResult, SyncReport};
use super::snapshot::{calendar_day, record_daily_snapshot, Clock, SnapshotOutcome, SystemClock};
use crate::db::models::{Account, Project};
use crate::db::Database;
use crate::metrics::{link, MetricRecord};
use crate::sheets::{MetricSource, SourceRow};

/// sync_state key holding the JSON of the most recent report.
pub const LAST_REPORT_KEY: &str = "last_sync_report";

/// What a run should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    All,
    Project(i64),
}

impl From<Option<i64>> for SyncTarget {
    fn from(project_id: Option<i64>) -> Self {
        project_id.map_or(SyncTarget::All, SyncTarget::Project)
    }
}

/// Drives sync runs against one local store and one external source.
pub struct Syncer {
    db: Arc<dyn Database>,
    source: Arc<dyn MetricSource>,
    clock: Arc<dyn Clock>,
    concurrency: usize,
}

impl Syncer {
    pub fn new(db: Arc<dyn Database>, source: Arc<dyn MetricSource>) -> Self {
        Self {
            db,
            source,
            clock: Arc::new(SystemClock),
            concurrency: 1,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of projects synced at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sync a single project. Never fails: problems end up in the result.
    pub async fn sync_project(&self, project_id: i64) -> ProjectSyncResult {
        let project = match self.db.get_project(project_id).await {
            Ok(Some(project)) if project.is_active => project,
            Ok(_) => {
                warn!(project_id, "Sync requested for unknown or inactive project");
                return ProjectSyncResult::failed(
                    project_id,
                    None,
                    ProjectErrorKind::NotFound,
                    SyncError::ProjectNotFound(project_id).to_string(),
                    self.clock.now(),
                );
            }
            Err(e) => {
                warn!(project_id, error = %e, "Failed to load project");
                return ProjectSyncResult::failed(
                    project_id,
                    None,
                    ProjectErrorKind::Store,
                    format!("{e:#}"),
                    self.clock.now(),
                );
            }
        };

        self.sync_loaded_project(&project).await
    }

    /// Sync every active project. Fails only if the project list itself
    /// can't be read.
    pub async fn sync_all_projects(&self) -> Result<SyncReport, SyncError> {
        let projects = self.db.list_active_projects().await?;
        info!(
            projects = projects.len(),
            concurrency = self.concurrency,
            "Starting sync of all active projects"
        );

        // buffered (not buffer_unordered) keeps results in project order
        let futures: Vec<_> = projects
            .iter()
            .map(|project| self.sync_loaded_project(project))
            .collect();
        let results: Vec<ProjectSyncResult> = stream::iter(futures)
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = build_report(results, self.clock.now());
        info!(
            total = report.total_projects,
            succeeded = report.success_count,
            errors = report.error_count,
            degraded = report.degraded,
            "Sync complete"
        );
        Ok(report)
    }

    /// Run a sync and persist its report as the last known one.
    ///
    /// A single-project run against an unknown project is not persisted,
    /// so a bad request can't overwrite the real last report.
    pub async fn run(&self, target: SyncTarget) -> Result<SyncReport, SyncError> {
        let report = match target {
            SyncTarget::All => self.sync_all_projects().await?,
            SyncTarget::Project(project_id) => {
                let result = self.sync_project(project_id).await;
                build_report(vec![result], self.clock.now())
            }
        };

        if !report.projects.iter().any(|p| p.is_not_found()) {
            if let Err(e) = self.save_report(&report).await {
                warn!(error = %e, "Failed to persist sync report");
            }
        }
        Ok(report)
    }

    async fn save_report(&self, report: &SyncReport) -> anyhow::Result<()> {
        let json = serde_json::to_string(report)?;
        self.db.set_sync_state(LAST_REPORT_KEY, &json).await
    }

    async fn sync_loaded_project(&self, project: &Project) -> ProjectSyncResult {
        let now = self.clock.now();
        let day = calendar_day(now);
        let mut result = ProjectSyncResult::empty(project.id, Some(project.name.clone()), now);

        let accounts = match self.db.list_accounts(project.id).await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(project_id = project.id, error = %e, "Failed to list accounts");
                return ProjectSyncResult::failed(
                    project.id,
                    Some(project.name.clone()),
                    ProjectErrorKind::Store,
                    format!("{e:#}"),
                    self.clock.now(),
                );
            }
        };
        result.accounts_total = accounts.len() as u64;

        let external = match self.source.read_accounts(&project.name).await {
            Ok(rows) => index_rows(rows, now),
            Err(e) => {
                let err = SyncError::from(e);
                warn!(
                    project_id = project.id,
                    project = %project.name,
                    error = %err,
                    "External source unavailable, syncing from local cache only"
                );
                result.degraded = true;
                result.degraded_reason = Some(err.to_string());
                HashMap::new()
            }
        };

        for account in &accounts {
            match self.sync_account(account, &external, now, day).await {
                Ok(SnapshotOutcome::Written) => {
                    result.accounts_updated += 1;
                    result.snapshots_created += 1;
                }
                Ok(SnapshotOutcome::SkippedDuplicate) => {
                    result.accounts_updated += 1;
                    result.snapshots_skipped += 1;
                }
                Err(e) => {
                    warn!(project_id = project.id, error = %e, "Account sync failed, continuing");
                    result.accounts_failed += 1;
                }
            }
        }

        result.completed_at = self.clock.now();
        info!(
            project_id = project.id,
            project = %project.name,
            updated = result.accounts_updated,
            failed = result.accounts_failed,
            snapshots = result.snapshots_created,
            degraded = result.degraded,
            "Project synced"
        );
        result
    }

    /// One account through the pipeline. `stage` is the last step that
    /// completed, so a failure names how far it got.
    async fn sync_account(
        &self,
        account: &Account,
        external: &HashMap<String, MetricRecord>,
        now: DateTime<Utc>,
        day: NaiveDate,
    ) -> Result<SnapshotOutcome, SyncError> {
        let fail = |stage: AccountStage, e: &dyn std::fmt::Display| {
            SyncError::account(account.id, stage, e)
        };

        // No matching row reads as zeros, so the merge keeps the local value
        let external_record = match external.get(&link::match_key(&account.profile_link)) {
            Some(record) => *record,
            None => {
                debug!(
                    account_id = account.id,
                    link = %account.profile_link,
                    "No sheet row for account, keeping local values"
                );
                MetricRecord::zero(now)
            }
        };
        let mut stage = AccountStage::ExternalFetched;

        let local = self
            .db
            .get_account_metrics(account.id)
            .await
            .map_err(|e| fail(stage, &e))?;
        stage = AccountStage::LocalFetched;

        let merged = merge(&external_record, &local, now);
        stage = AccountStage::Merged;

        self.db
            .set_account_metrics(account.id, &merged)
            .await
            .map_err(|e| fail(stage, &e))?;
        stage = AccountStage::Persisted;

        let outcome = record_daily_snapshot(self.db.as_ref(), account.id, &merged, day)
            .await
            .map_err(|e| fail(stage, &e))?;
        stage = AccountStage::SnapshotChecked;

        let changed = !merged.same_counts(&local);
        debug!(account_id = account.id, %stage, changed, ?outcome, "Account synced");
        Ok(outcome)
    }
}

/// The last persisted report, if any run has completed.
pub async fn load_last_report(db: &dyn Database) -> anyhow::Result<Option<SyncReport>> {
    match db.get_sync_state(LAST_REPORT_KEY).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Key sheet rows by canonical link. Repeated rows for one account are
/// merged rather than letting the last one win.
fn index_rows(rows: Vec<SourceRow>, now: DateTime<Utc>) -> HashMap<String, MetricRecord> {
    let mut by_link: HashMap<String, MetricRecord> = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = link::match_key(&row.profile_link);
        let record = match by_link.get(&key) {
            Some(existing) => merge(&row.record, existing, now),
            None => row.record,
        };
        by_link.insert(key, record);
    }
    by_link
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewProject;
    use crate::metrics::ProfileLink;
    use crate::sheets::{NoopSource, SourceError};
    use crate::sync::snapshot::FixedClock;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct StaticSource(Vec<SourceRow>);

    #[async_trait]
    impl MetricSource for StaticSource {
        async fn read_accounts(&self, _project_name: &str) -> Result<Vec<SourceRow>, SourceError> {
            Ok(self.0.clone())
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn rec(followers: u64, views: u64) -> MetricRecord {
        MetricRecord {
            followers,
            views,
            ..MetricRecord::zero(noon())
        }
    }

    async fn seed(db: &Arc<dyn Database>, name: &str, links: &[&str]) -> (i64, Vec<i64>) {
        let project_id = db
            .insert_project(&NewProject {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for raw in links {
            let link = ProfileLink::parse(raw).unwrap();
            ids.push(db.insert_account(project_id, &link).await.unwrap());
        }
        (project_id, ids)
    }

    #[test]
    fn test_index_rows_merges_duplicates() {
        let rows = vec![
            SourceRow {
                profile_link: "https://www.tiktok.com/@dup".to_string(),
                record: rec(10, 500),
            },
            SourceRow {
                profile_link: "tiktok.com/@dup/".to_string(),
                record: rec(20, 100),
            },
        ];
        let map = index_rows(rows, noon());
        assert_eq!(map.len(), 1);
        let merged = map.values().next().unwrap();
        assert_eq!(merged.followers, 20);
        assert_eq!(merged.views, 500);
    }

    #[test]
    fn test_sync_target_from_option() {
        assert_eq!(SyncTarget::from(None), SyncTarget::All);
        assert_eq!(SyncTarget::from(Some(3)), SyncTarget::Project(3));
    }

    #[tokio::test]
    async fn test_sync_project_merges_and_snapshots() {
        let db = crate::db::open_in_memory().unwrap();
        let (project_id, ids) = seed(&db, "Launch", &["https://tiktok.com/@one"]).await;
        db.set_account_metrics(ids[0], &rec(1000, 50_000)).await.unwrap();

        let source = StaticSource(vec![SourceRow {
            profile_link: "https://www.tiktok.com/@one".to_string(),
            record: rec(950, 52_000),
        }]);
        let syncer = Syncer::new(db.clone(), Arc::new(source)).with_clock(Arc::new(FixedClock(noon())));

        let result = syncer.sync_project(project_id).await;
        assert_eq!(result.accounts_total, 1);
        assert_eq!(result.accounts_updated, 1);
        assert_eq!(result.snapshots_created, 1);
        assert!(!result.degraded);

        let local = db.get_account_metrics(ids[0]).await.unwrap();
        assert_eq!(local.followers, 1000);
        assert_eq!(local.views, 52_000);
    }

    #[tokio::test]
    async fn test_unconfigured_source_degrades() {
        let db = crate::db::open_in_memory().unwrap();
        let (project_id, ids) = seed(&db, "Solo", &["https://instagram.com/solo"]).await;
        db.set_account_metrics(ids[0], &rec(42, 4200)).await.unwrap();

        let syncer = Syncer::new(db.clone(), Arc::new(NoopSource)).with_clock(Arc::new(FixedClock(noon())));
        let result = syncer.sync_project(project_id).await;

        assert!(result.degraded);
        assert!(result.degraded_reason.is_some());
        assert!(result.is_success());
        assert_eq!(result.accounts_updated, 1);
        let local = db.get_account_metrics(ids[0]).await.unwrap();
        assert_eq!(local.followers, 42);
        assert_eq!(local.views, 4200);
    }

    #[tokio::test]
    async fn test_inactive_project_is_not_found() {
        let db = crate::db::open_in_memory().unwrap();
        let (project_id, _) = seed(&db, "Paused", &[]).await;
        db.set_project_active(project_id, false).await.unwrap();

        let syncer = Syncer::new(db, Arc::new(NoopSource));
        let result = syncer.sync_project(project_id).await;
        assert!(result.is_not_found());
    }

    #[tokio::test]
    async fn test_run_persists_last_report() {
        let db = crate::db::open_in_memory().unwrap();
        seed(&db, "Persist", &["https://youtube.com/@chan"]).await;
        let syncer = Syncer::new(db.clone(), Arc::new(NoopSource)).with_clock(Arc::new(FixedClock(noon())));

        assert!(load_last_report(db.as_ref()).await.unwrap().is_none());
        let report = syncer.run(SyncTarget::All).await.unwrap();
        let saved = load_last_report(db.as_ref()).await.unwrap().unwrap();
        assert_eq!(saved, report);

        // Unknown project doesn't replace it
        syncer.run(SyncTarget::Project(999)).await.unwrap();
        let still = load_last_report(db.as_ref()).await.unwrap().unwrap();
        assert_eq!(still, report);
    }
}
