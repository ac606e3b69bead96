use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sheets::SourceError;

/// Where an account's sync pipeline got to before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStage {
    Pending,
    ExternalFetched,
    LocalFetched,
    Merged,
    Persisted,
    SnapshotChecked,
}

impl AccountStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStage::Pending => "pending",
            AccountStage::ExternalFetched => "external_fetched",
            AccountStage::LocalFetched => "local_fetched",
            AccountStage::Merged => "merged",
            AccountStage::Persisted => "persisted",
            AccountStage::SnapshotChecked => "snapshot_checked",
        }
    }
}

impl std::fmt::Display for AccountStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failures inside a sync run.
///
/// Only `Store` escapes `sync_all_projects`; the others are recovered at
/// the account or project level and show up as counts in the report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Sheet unreachable or unusable; the project falls back to cache-only.
    #[error(transparent)]
    SourceUnavailable(#[from] SourceError),

    /// One account failed; the rest of the project carries on.
    #[error("account {account_id} failed after {stage}: {reason}")]
    AccountProcessing {
        account_id: i64,
        stage: AccountStage,
        reason: String,
    },

    #[error("project {0} not found or inactive")]
    ProjectNotFound(i64),

    /// Another writer got today's snapshot in first.
    #[error("snapshot for account {account_id} on {day} already written")]
    SnapshotWriteConflict { account_id: i64, day: NaiveDate },

    /// The local store itself failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl SyncError {
    pub fn account(account_id: i64, stage: AccountStage, err: impl std::fmt::Display) -> Self {
        SyncError::AccountProcessing {
            account_id,
            stage,
            reason: err.to_string(),
        }
    }
}
