// Database trait — async interface over the local store.
//
// Implementor: SqliteDatabase (wraps rusqlite behind a tokio Mutex).
// The sync orchestrator and the web handlers only see `Arc<dyn Database>`,
// which also lets tests wrap the real store to inject failures.
//
// The trait mirrors the queries.rs function signatures.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::models::{Account, NewProject, Project, ProjectCounts, Snapshot};
use crate::metrics::{MetricRecord, ProfileLink};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Projects ---

    /// Create a project and return its ID.
    async fn insert_project(&self, project: &NewProject) -> Result<i64>;

    /// Look up a project by ID, active or not.
    async fn get_project(&self, project_id: i64) -> Result<Option<Project>>;

    /// All active projects, oldest first.
    async fn list_active_projects(&self) -> Result<Vec<Project>>;

    /// Flip a project's active flag. Returns false if it doesn't exist.
    async fn set_project_active(&self, project_id: i64, active: bool) -> Result<bool>;

    /// Total and active project counts.
    async fn count_projects(&self) -> Result<ProjectCounts>;

    // --- Accounts ---

    /// Add an account to a project and return its ID.
    async fn insert_account(&self, project_id: i64, link: &ProfileLink) -> Result<i64>;

    /// All accounts in a project.
    async fn list_accounts(&self, project_id: i64) -> Result<Vec<Account>>;

    /// The account's current cached counters.
    async fn get_account_metrics(&self, account_id: i64) -> Result<MetricRecord>;

    /// Overwrite the account's cached counters.
    async fn set_account_metrics(&self, account_id: i64, record: &MetricRecord) -> Result<()>;

    // --- Snapshots ---

    /// Whether the account already has a snapshot for `date`.
    async fn has_snapshot(&self, account_id: i64, date: NaiveDate) -> Result<bool>;

    /// Insert a snapshot; false if one already exists for that day.
    async fn insert_snapshot(
        &self,
        account_id: i64,
        record: &MetricRecord,
        date: NaiveDate,
    ) -> Result<bool>;

    /// An account's history, newest day first.
    async fn list_snapshots(&self, account_id: i64, limit: u32) -> Result<Vec<Snapshot>>;

    /// Total snapshot rows.
    async fn count_snapshots(&self) -> Result<u64>;

    /// Delete all history and return the number of rows removed.
    async fn clear_snapshots(&self) -> Result<usize>;

    // --- Sync state ---

    /// Get a sync state value by key (e.g., "last_sync_report").
    async fn get_sync_state(&self, key: &str) -> Result<Option<String>>;

    /// Set a sync state value (upsert).
    async fn set_sync_state(&self, key: &str, value: &str) -> Result<()>;
}
