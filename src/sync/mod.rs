// Smart sync — reconcile the sheet and the local cache, then record history.

pub mod error;
pub mod merge;
pub mod orchestrator;
pub mod report;
pub mod snapshot;

pub use error::{AccountStage, SyncError};
pub use merge::merge;
pub use orchestrator::{load_last_report, SyncTarget, Syncer, LAST_REPORT_KEY};
pub use report::{build_report, ProjectError, ProjectErrorKind, ProjectSyncResult, SyncReport};
pub use snapshot::{calendar_day, record_daily_snapshot, Clock, FixedClock, SnapshotOutcome, SystemClock};
