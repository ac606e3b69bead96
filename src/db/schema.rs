// Database schema — table creation.
//
// A `schema_version` table records the schema a database was created with,
// so later changes can be applied as numbered migrations.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Campaigns: a view target over a set of accounts and a date range
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,          -- also the worksheet name in the Google Sheet
            target_views INTEGER NOT NULL DEFAULT 0,
            start_date TEXT,                    -- YYYY-MM-DD
            end_date TEXT,                      -- YYYY-MM-DD
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Tracked profiles. The counter columns are the current merged values.
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            platform TEXT NOT NULL,             -- tiktok / instagram / facebook / youtube / threads
            profile_link TEXT NOT NULL,         -- canonical link, the identity within a project
            username TEXT,                      -- best-effort, parsed from the link
            followers INTEGER NOT NULL DEFAULT 0,
            likes INTEGER NOT NULL DEFAULT 0,
            comments INTEGER NOT NULL DEFAULT 0,
            videos INTEGER NOT NULL DEFAULT 0,
            views INTEGER NOT NULL DEFAULT 0,
            metrics_updated_at TEXT,            -- RFC 3339, null until first sync
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (project_id, profile_link)
        );

        -- Daily history, one row per account per UTC day
        CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            snapshot_date TEXT NOT NULL,        -- YYYY-MM-DD (UTC)
            followers INTEGER NOT NULL DEFAULT 0,
            likes INTEGER NOT NULL DEFAULT 0,
            comments INTEGER NOT NULL DEFAULT 0,
            videos INTEGER NOT NULL DEFAULT 0,
            views INTEGER NOT NULL DEFAULT 0,
            captured_at TEXT NOT NULL,          -- RFC 3339
            UNIQUE (account_id, snapshot_date)
        );

        -- Sync state — last report and other small key/value bookkeeping
        CREATE TABLE IF NOT EXISTS sync_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Index for loading a project's accounts
        CREATE INDEX IF NOT EXISTS idx_accounts_project
            ON accounts(project_id);

        -- Index for bucketing history by day
        CREATE INDEX IF NOT EXISTS idx_snapshots_date
            ON snapshots(snapshot_date);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
