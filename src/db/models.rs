// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricRecord, Platform};

/// A tracked campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    /// Also the worksheet name in the Google Sheet.
    pub name: String,
    pub target_views: u64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: String,
}

/// Fields needed to create a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub target_views: u64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A tracked social profile within one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub project_id: i64,
    pub platform: Platform,
    /// Canonical link — unique within the project.
    pub profile_link: String,
    pub username: Option<String>,
    pub created_at: String,
}

/// One day of history for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub account_id: i64,
    pub snapshot_date: NaiveDate,
    pub metrics: MetricRecord,
}

/// Project totals for the status surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCounts {
    pub total_projects: u64,
    pub active_projects: u64,
}
