// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// Holding the lock for the whole call also gives snapshot writes a single
// writer; the unique constraint covers separate processes.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Account, NewProject, Project, ProjectCounts, Snapshot};
use super::queries;
use super::traits::Database;
use crate::metrics::{MetricRecord, ProfileLink};

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_project(&self, project: &NewProject) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::insert_project(&conn, project)
    }

    async fn get_project(&self, project_id: i64) -> Result<Option<Project>> {
        let conn = self.conn.lock().await;
        queries::get_project(&conn, project_id)
    }

    async fn list_active_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock().await;
        queries::list_active_projects(&conn)
    }

    async fn set_project_active(&self, project_id: i64, active: bool) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::set_project_active(&conn, project_id, active)
    }

    async fn count_projects(&self) -> Result<ProjectCounts> {
        let conn = self.conn.lock().await;
        queries::count_projects(&conn)
    }

    async fn insert_account(&self, project_id: i64, link: &ProfileLink) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::insert_account(&conn, project_id, link)
    }

    async fn list_accounts(&self, project_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn.lock().await;
        queries::list_accounts(&conn, project_id)
    }

    async fn get_account_metrics(&self, account_id: i64) -> Result<MetricRecord> {
        let conn = self.conn.lock().await;
        queries::get_account_metrics(&conn, account_id)
    }

    async fn set_account_metrics(&self, account_id: i64, record: &MetricRecord) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::set_account_metrics(&conn, account_id, record)
    }

    async fn has_snapshot(&self, account_id: i64, date: NaiveDate) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::has_snapshot(&conn, account_id, date)
    }

    async fn insert_snapshot(
        &self,
        account_id: i64,
        record: &MetricRecord,
        date: NaiveDate,
    ) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::insert_snapshot(&conn, account_id, record, date)
    }

    async fn list_snapshots(&self, account_id: i64, limit: u32) -> Result<Vec<Snapshot>> {
        let conn = self.conn.lock().await;
        queries::list_snapshots(&conn, account_id, limit)
    }

    async fn count_snapshots(&self) -> Result<u64> {
        let conn = self.conn.lock().await;
        queries::count_snapshots(&conn)
    }

    async fn clear_snapshots(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        queries::clear_snapshots(&conn)
    }

    async fn get_sync_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        queries::get_sync_state(&conn, key)
    }

    async fn set_sync_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::set_sync_state(&conn, key, value)
    }
}
