// External metric source trait — what the sync needs from the spreadsheet.
//
// The default implementation reads a Google Sheet over the v4 values API.
// NoopSource stands in when no spreadsheet is configured so a sync still
// runs in cache-only mode instead of refusing to start.

use async_trait::async_trait;
use thiserror::Error;

use crate::metrics::MetricRecord;

/// One account's row from the external source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// Link as written in the sheet (not yet canonicalised).
    pub profile_link: String,
    pub record: MetricRecord,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("external source not configured: {0}")]
    NotConfigured(String),

    #[error("external source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed sheet {sheet:?}: {reason}")]
    Malformed { sheet: String, reason: String },
}

/// Reads per-project metric rows from the external store.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// All rows for the project's worksheet.
    async fn read_accounts(&self, project_name: &str) -> Result<Vec<SourceRow>, SourceError>;
}

/// Source used when no spreadsheet is configured. Every read reports
/// NotConfigured, which the sync treats as cache-only.
pub struct NoopSource;

#[async_trait]
impl MetricSource for NoopSource {
    async fn read_accounts(&self, _project_name: &str) -> Result<Vec<SourceRow>, SourceError> {
        Err(SourceError::NotConfigured(
            "set GOOGLE_SHEETS_SPREADSHEET_ID and GOOGLE_SHEETS_API_KEY".to_string(),
        ))
    }
}
