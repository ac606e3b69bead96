// External source — the Google Sheet operators can hand-edit.

pub mod client;
pub mod parse;
pub mod traits;

pub use client::SheetsClient;
pub use traits::{MetricSource, NoopSource, SourceError, SourceRow};

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;

/// Build the configured metric source, or a NoopSource (cache-only syncs)
/// when the spreadsheet isn't configured.
pub fn build_source(config: &Config) -> Result<Arc<dyn MetricSource>> {
    if !config.sheets_configured() {
        warn!("Google Sheets not configured; syncs will run in cache-only mode");
        return Ok(Arc::new(NoopSource));
    }

    info!(spreadsheet = %config.sheets_spreadsheet_id, "Using Google Sheets metric source");
    let client = SheetsClient::new(
        &config.sheets_api_url,
        &config.sheets_spreadsheet_id,
        &config.sheets_api_key,
        config.sheets_timeout,
    )?;
    Ok(Arc::new(client))
}
