// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.
//
// Counters are u64 in Rust and INTEGER (i64) in SQLite. Values above
// i64::MAX are clamped on write; negative values read back as 0.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Account, NewProject, Project, ProjectCounts, Snapshot};
use crate::metrics::{MetricRecord, Platform, ProfileLink};

const DATE_FORMAT: &str = "%Y-%m-%d";

// --- Projects ---

/// Create a project and return its ID.
pub fn insert_project(conn: &Connection, project: &NewProject) -> Result<i64> {
    conn.execute(
        "INSERT INTO projects (name, target_views, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            project.name,
            to_db_count(project.target_views),
            project.start_date.map(format_date),
            project.end_date.map(format_date),
        ],
    )
    .with_context(|| format!("Failed to create project {:?}", project.name))?;
    Ok(conn.last_insert_rowid())
}

/// Look up a project by ID (active or not).
pub fn get_project(conn: &Connection, project_id: i64) -> Result<Option<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, target_views, start_date, end_date, is_active, created_at
         FROM projects WHERE id = ?1",
    )?;
    let project = stmt
        .query_row(params![project_id], project_from_row)
        .optional()?;
    Ok(project)
}

/// All active projects, oldest first.
pub fn list_active_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, target_views, start_date, end_date, is_active, created_at
         FROM projects WHERE is_active = 1 ORDER BY id",
    )?;
    let rows = stmt.query_map([], project_from_row)?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row?);
    }
    Ok(projects)
}

/// Flip a project's active flag. Returns false if the project doesn't exist.
pub fn set_project_active(conn: &Connection, project_id: i64, active: bool) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE projects SET is_active = ?2 WHERE id = ?1",
        params![project_id, active],
    )?;
    Ok(changed > 0)
}

/// Total and active project counts.
pub fn count_projects(conn: &Connection) -> Result<ProjectCounts> {
    let (total, active): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM projects",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(ProjectCounts {
        total_projects: from_db_count(total),
        active_projects: from_db_count(active),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let start: Option<String> = row.get(3)?;
    let end: Option<String> = row.get(4)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        target_views: from_db_count(row.get(2)?),
        start_date: start.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
        end_date: end.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
        is_active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// --- Accounts ---

/// Add an account to a project and return its ID.
///
/// Fails if the project already tracks the same canonical link.
pub fn insert_account(conn: &Connection, project_id: i64, link: &ProfileLink) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts (project_id, platform, profile_link, username)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            project_id,
            link.platform.as_str(),
            link.canonical,
            link.username,
        ],
    )
    .with_context(|| {
        format!(
            "Failed to add {} to project {project_id}",
            link.canonical
        )
    })?;
    Ok(conn.last_insert_rowid())
}

/// All accounts in a project, in insertion order.
pub fn list_accounts(conn: &Connection, project_id: i64) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, platform, profile_link, username, created_at
         FROM accounts WHERE project_id = ?1 ORDER BY id",
    )?;

    let rows = stmt.query_map(params![project_id], |row| {
        let platform: String = row.get(2)?;
        let platform: Platform = platform
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        Ok(Account {
            id: row.get(0)?,
            project_id: row.get(1)?,
            platform,
            profile_link: row.get(3)?,
            username: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(row?);
    }
    Ok(accounts)
}

/// The account's current cached counters.
///
/// Accounts that have never been synced carry zero counters stamped with
/// their creation time.
pub fn get_account_metrics(conn: &Connection, account_id: i64) -> Result<MetricRecord> {
    let mut stmt = conn.prepare(
        "SELECT followers, likes, comments, videos, views, metrics_updated_at, created_at
         FROM accounts WHERE id = ?1",
    )?;

    let record = stmt
        .query_row(params![account_id], |row| {
            let updated_at: Option<String> = row.get(5)?;
            let created_at: String = row.get(6)?;
            let observed_at = updated_at
                .as_deref()
                .and_then(parse_timestamp)
                .or_else(|| parse_timestamp(&created_at))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            Ok(MetricRecord {
                followers: from_db_count(row.get(0)?),
                likes: from_db_count(row.get(1)?),
                comments: from_db_count(row.get(2)?),
                videos: from_db_count(row.get(3)?),
                views: from_db_count(row.get(4)?),
                observed_at,
            })
        })
        .optional()?;

    record.with_context(|| format!("Account {account_id} not found"))
}

/// Overwrite the account's cached counters.
pub fn set_account_metrics(conn: &Connection, account_id: i64, record: &MetricRecord) -> Result<()> {
    let changed = conn.execute(
        "UPDATE accounts SET
            followers = ?2,
            likes = ?3,
            comments = ?4,
            videos = ?5,
            views = ?6,
            metrics_updated_at = ?7
         WHERE id = ?1",
        params![
            account_id,
            to_db_count(record.followers),
            to_db_count(record.likes),
            to_db_count(record.comments),
            to_db_count(record.videos),
            to_db_count(record.views),
            record.observed_at.to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        anyhow::bail!("Account {account_id} not found");
    }
    Ok(())
}

// --- Snapshots ---

/// Whether the account already has a snapshot for `date`.
pub fn has_snapshot(conn: &Connection, account_id: i64, date: NaiveDate) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM snapshots WHERE account_id = ?1 AND snapshot_date = ?2)",
        params![account_id, format_date(date)],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Insert a snapshot for `date`. Returns false (and writes nothing) if one
/// already exists for that account and day.
pub fn insert_snapshot(
    conn: &Connection,
    account_id: i64,
    record: &MetricRecord,
    date: NaiveDate,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO snapshots
            (account_id, snapshot_date, followers, likes, comments, videos, views, captured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(account_id, snapshot_date) DO NOTHING",
        params![
            account_id,
            format_date(date),
            to_db_count(record.followers),
            to_db_count(record.likes),
            to_db_count(record.comments),
            to_db_count(record.videos),
            to_db_count(record.views),
            record.observed_at.to_rfc3339(),
        ],
    )?;
    Ok(inserted > 0)
}

/// An account's history, newest day first.
pub fn list_snapshots(conn: &Connection, account_id: i64, limit: u32) -> Result<Vec<Snapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, snapshot_date, followers, likes, comments, videos, views, captured_at
         FROM snapshots
         WHERE account_id = ?1
         ORDER BY snapshot_date DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![account_id, limit], |row| {
        let date: String = row.get(2)?;
        let snapshot_date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        let captured_at: String = row.get(8)?;
        Ok(Snapshot {
            id: row.get(0)?,
            account_id: row.get(1)?,
            snapshot_date,
            metrics: MetricRecord {
                followers: from_db_count(row.get(3)?),
                likes: from_db_count(row.get(4)?),
                comments: from_db_count(row.get(5)?),
                videos: from_db_count(row.get(6)?),
                views: from_db_count(row.get(7)?),
                observed_at: parse_timestamp(&captured_at).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            },
        })
    })?;

    let mut snapshots = Vec::new();
    for row in rows {
        snapshots.push(row?);
    }
    Ok(snapshots)
}

/// Total snapshot rows across all accounts.
pub fn count_snapshots(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
    Ok(from_db_count(count))
}

/// Delete all history. Growth baselines restart from the next sync.
pub fn clear_snapshots(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM snapshots", [])?;
    Ok(deleted)
}

// --- Sync state ---

/// Get a sync state value by key (e.g., "last_sync_report").
pub fn get_sync_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM sync_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a sync state value (upsert).
pub fn set_sync_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Helpers ---

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Accepts RFC 3339 (what we write) and SQLite's `datetime('now')` format.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use chrono::TimeZone;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn seed_project(conn: &Connection, name: &str) -> i64 {
        insert_project(
            conn,
            &NewProject {
                name: name.to_string(),
                target_views: 1_000_000,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn record(followers: u64, views: u64) -> MetricRecord {
        MetricRecord {
            followers,
            likes: 10,
            comments: 2,
            videos: 3,
            views,
            observed_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_project_roundtrip() {
        let conn = test_db();
        let id = insert_project(
            &conn,
            &NewProject {
                name: "Spring Launch".to_string(),
                target_views: 5_000_000,
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1),
                end_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            },
        )
        .unwrap();

        let project = get_project(&conn, id).unwrap().unwrap();
        assert_eq!(project.name, "Spring Launch");
        assert_eq!(project.target_views, 5_000_000);
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(project.is_active);

        assert!(get_project(&conn, id + 100).unwrap().is_none());
    }

    #[test]
    fn test_active_projects_and_counts() {
        let conn = test_db();
        let a = seed_project(&conn, "A");
        let b = seed_project(&conn, "B");
        assert!(set_project_active(&conn, b, false).unwrap());
        assert!(!set_project_active(&conn, 999, false).unwrap());

        let active = list_active_projects(&conn).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a);

        let counts = count_projects(&conn).unwrap();
        assert_eq!(counts.total_projects, 2);
        assert_eq!(counts.active_projects, 1);
    }

    #[test]
    fn test_count_projects_empty() {
        let conn = test_db();
        assert_eq!(count_projects(&conn).unwrap(), ProjectCounts::default());
    }

    #[test]
    fn test_account_link_unique_per_project() {
        let conn = test_db();
        let p1 = seed_project(&conn, "One");
        let p2 = seed_project(&conn, "Two");
        let link = ProfileLink::parse("https://www.tiktok.com/@creator").unwrap();

        insert_account(&conn, p1, &link).unwrap();
        assert!(insert_account(&conn, p1, &link).is_err());
        // Same link in another project is a different account
        insert_account(&conn, p2, &link).unwrap();

        let accounts = list_accounts(&conn, p1).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].platform, Platform::Tiktok);
        assert_eq!(accounts[0].profile_link, "https://tiktok.com/@creator");
        assert_eq!(accounts[0].username.as_deref(), Some("creator"));
    }

    #[test]
    fn test_account_metrics_roundtrip() {
        let conn = test_db();
        let p = seed_project(&conn, "P");
        let link = ProfileLink::parse("instagram.com/brand").unwrap();
        let id = insert_account(&conn, p, &link).unwrap();

        // Fresh accounts start at zero
        let fresh = get_account_metrics(&conn, id).unwrap();
        assert_eq!(fresh.counters(), [0; 5]);

        let rec = record(1_000, 50_000);
        set_account_metrics(&conn, id, &rec).unwrap();
        assert_eq!(get_account_metrics(&conn, id).unwrap(), rec);
    }

    #[test]
    fn test_account_metrics_missing_account() {
        let conn = test_db();
        assert!(get_account_metrics(&conn, 42).is_err());
        assert!(set_account_metrics(&conn, 42, &record(1, 1)).is_err());
    }

    #[test]
    fn test_snapshot_insert_is_once_per_day() {
        let conn = test_db();
        let p = seed_project(&conn, "P");
        let link = ProfileLink::parse("https://youtube.com/@chan").unwrap();
        let id = insert_account(&conn, p, &link).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        assert!(!has_snapshot(&conn, id, day).unwrap());
        assert!(insert_snapshot(&conn, id, &record(10, 100), day).unwrap());
        assert!(has_snapshot(&conn, id, day).unwrap());

        // Second insert for the same day is a no-op
        assert!(!insert_snapshot(&conn, id, &record(20, 200), day).unwrap());
        let history = list_snapshots(&conn, id, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].metrics.views, 100);
        assert_eq!(count_snapshots(&conn).unwrap(), 1);
    }

    #[test]
    fn test_snapshots_newest_first_and_clear() {
        let conn = test_db();
        let p = seed_project(&conn, "P");
        let link = ProfileLink::parse("https://threads.net/@poster").unwrap();
        let id = insert_account(&conn, p, &link).unwrap();

        for day in 1..=3 {
            let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
            insert_snapshot(&conn, id, &record(u64::from(day), 0), date).unwrap();
        }

        let history = list_snapshots(&conn, id, 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].snapshot_date, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert_eq!(history[1].snapshot_date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());

        assert_eq!(clear_snapshots(&conn).unwrap(), 3);
        assert_eq!(count_snapshots(&conn).unwrap(), 0);
    }

    #[test]
    fn test_sync_state_roundtrip() {
        let conn = test_db();
        assert_eq!(get_sync_state(&conn, "last_sync_report").unwrap(), None);

        set_sync_state(&conn, "last_sync_report", "{}").unwrap();
        assert_eq!(
            get_sync_state(&conn, "last_sync_report").unwrap(),
            Some("{}".to_string())
        );

        // Upsert overwrites
        set_sync_state(&conn, "last_sync_report", r#"{"a":1}"#).unwrap();
        assert_eq!(
            get_sync_state(&conn, "last_sync_report").unwrap(),
            Some(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn test_counts_clamp_to_sqlite_range() {
        assert_eq!(to_db_count(u64::MAX), i64::MAX);
        assert_eq!(from_db_count(-5), 0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2026-03-01T12:00:00+00:00").unwrap();
        let sqlite = parse_timestamp("2026-03-01 12:00:00").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(parse_timestamp("yesterday").is_none());
    }
}
