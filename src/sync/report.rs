// Sync report — per-project results folded into one JSON-friendly summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a project couldn't be synced at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectErrorKind {
    NotFound,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectError {
    pub kind: ProjectErrorKind,
    pub message: String,
}

/// Outcome of syncing one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSyncResult {
    pub project_id: i64,
    pub project_name: Option<String>,
    pub accounts_total: u64,
    pub accounts_updated: u64,
    pub accounts_failed: u64,
    pub snapshots_created: u64,
    pub snapshots_skipped: u64,
    /// True when the sheet couldn't be read and local values were kept.
    pub degraded: bool,
    pub degraded_reason: Option<String>,
    /// Project-level failure. Account failures only show in `accounts_failed`.
    pub error: Option<ProjectError>,
    pub completed_at: DateTime<Utc>,
}

impl ProjectSyncResult {
    pub fn empty(project_id: i64, project_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            project_id,
            project_name,
            accounts_total: 0,
            accounts_updated: 0,
            accounts_failed: 0,
            snapshots_created: 0,
            snapshots_skipped: 0,
            degraded: false,
            degraded_reason: None,
            error: None,
            completed_at: now,
        }
    }

    pub fn failed(
        project_id: i64,
        project_name: Option<String>,
        kind: ProjectErrorKind,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            error: Some(ProjectError {
                kind,
                message: message.into(),
            }),
            ..Self::empty(project_id, project_name, now)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.error,
            Some(ProjectError {
                kind: ProjectErrorKind::NotFound,
                ..
            })
        )
    }
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub total_projects: u64,
    /// Projects without a project-level error.
    pub success_count: u64,
    pub error_count: u64,
    /// True if any project ran cache-only.
    pub degraded: bool,
    pub projects: Vec<ProjectSyncResult>,
    pub generated_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn accounts_updated(&self) -> u64 {
        self.projects.iter().map(|p| p.accounts_updated).sum()
    }

    pub fn accounts_failed(&self) -> u64 {
        self.projects.iter().map(|p| p.accounts_failed).sum()
    }

    pub fn snapshots_created(&self) -> u64 {
        self.projects.iter().map(|p| p.snapshots_created).sum()
    }
}

/// Fold per-project results into a report, preserving their order.
pub fn build_report(projects: Vec<ProjectSyncResult>, generated_at: DateTime<Utc>) -> SyncReport {
    let success_count = projects.iter().filter(|p| p.is_success()).count() as u64;
    let total_projects = projects.len() as u64;
    SyncReport {
        total_projects,
        success_count,
        error_count: total_projects - success_count,
        degraded: projects.iter().any(|p| p.degraded),
        projects,
        generated_at,
    }
}
