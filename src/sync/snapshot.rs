// Snapshot dedup policy — at most one history row per account per UTC day.
//
// The day comes from one clock in UTC for both the existence check and the
// insert. The existence check skips the common case cheaply; the unique constraint
// behind insert_snapshot catches the race where two syncs pass the check
// together, and that conflict is folded into a skip.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SyncError;
use crate::db::Database;
use crate::metrics::MetricRecord;

/// Source of "now" for a sync run.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant (tests, replays).
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The calendar day a snapshot taken at `now` belongs to.
pub fn calendar_day(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// What happened to today's snapshot for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOutcome {
    Written,
    SkippedDuplicate,
}

/// Write the day's snapshot unless one already exists.
pub async fn record_daily_snapshot(
    db: &dyn Database,
    account_id: i64,
    record: &MetricRecord,
    day: NaiveDate,
) -> Result<SnapshotOutcome, SyncError> {
    if db.has_snapshot(account_id, day).await? {
        return Ok(SnapshotOutcome::SkippedDuplicate);
    }

    match write_snapshot(db, account_id, record, day).await {
        Ok(()) => Ok(SnapshotOutcome::Written),
        Err(err @ SyncError::SnapshotWriteConflict { .. }) => {
            debug!(account_id, error = %err, "Concurrent snapshot write, treating as duplicate");
            Ok(SnapshotOutcome::SkippedDuplicate)
        }
        Err(e) => Err(e),
    }
}

async fn write_snapshot(
    db: &dyn Database,
    account_id: i64,
    record: &MetricRecord,
    day: NaiveDate,
) -> Result<(), SyncError> {
    if db.insert_snapshot(account_id, record, day).await? {
        Ok(())
    } else {
        Err(SyncError::SnapshotWriteConflict { account_id, day })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewProject;
    use crate::metrics::ProfileLink;
    use chrono::TimeZone;

    async fn seeded() -> (std::sync::Arc<dyn Database>, i64) {
        let db = crate::db::open_in_memory().unwrap();
        let project_id = db
            .insert_project(&NewProject {
                name: "Snap".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let link = ProfileLink::parse("https://tiktok.com/@snap").unwrap();
        let account_id = db.insert_account(project_id, &link).await.unwrap();
        (db, account_id)
    }

    #[test]
    fn test_calendar_day_is_utc() {
        let late = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(calendar_day(late), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(calendar_day(early), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_fixed_clock() {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(FixedClock(t).now(), t);
    }

    #[tokio::test]
    async fn test_second_write_same_day_is_skipped() {
        let (db, account_id) = seeded().await;
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let record = MetricRecord::zero(Utc::now());

        let first = record_daily_snapshot(db.as_ref(), account_id, &record, day)
            .await
            .unwrap();
        let second = record_daily_snapshot(db.as_ref(), account_id, &record, day)
            .await
            .unwrap();
        assert_eq!(first, SnapshotOutcome::Written);
        assert_eq!(second, SnapshotOutcome::SkippedDuplicate);
        assert_eq!(db.count_snapshots().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_conflict_maps_to_error_variant() {
        let (db, account_id) = seeded().await;
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let record = MetricRecord::zero(Utc::now());

        write_snapshot(db.as_ref(), account_id, &record, day)
            .await
            .unwrap();
        // Bypassing the existence check hits the unique constraint
        let err = write_snapshot(db.as_ref(), account_id, &record, day)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::SnapshotWriteConflict { .. }));
    }

    #[tokio::test]
    async fn test_next_day_writes_again() {
        let (db, account_id) = seeded().await;
        let record = MetricRecord::zero(Utc::now());
        for day in 1..=2 {
            let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
            let outcome = record_daily_snapshot(db.as_ref(), account_id, &record, date)
                .await
                .unwrap();
            assert_eq!(outcome, SnapshotOutcome::Written);
        }
        assert_eq!(db.count_snapshots().await.unwrap(), 2);
    }
}
