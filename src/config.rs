use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::sheets::client::DEFAULT_SHEETS_API_URL;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Spreadsheet holding one worksheet per project. Empty means
    /// syncs run cache-only.
    pub sheets_spreadsheet_id: String,
    pub sheets_api_key: String,
    /// Sheets API endpoint (defaults to https://sheets.googleapis.com).
    pub sheets_api_url: String,
    /// Per-request timeout for Sheets reads.
    pub sheets_timeout: Duration,
    /// Minutes between background syncs in `serve`. Zero disables the timer.
    pub sync_interval_mins: u64,
    /// How many projects to sync at once.
    pub sync_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default — an unconfigured spreadsheet is allowed
    /// and just means cache-only syncs.
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: env::var("VIEWTRACK_DB_PATH").unwrap_or_else(|_| "./viewtrack.db".to_string()),
            sheets_spreadsheet_id: env::var("GOOGLE_SHEETS_SPREADSHEET_ID").unwrap_or_default(),
            sheets_api_key: env::var("GOOGLE_SHEETS_API_KEY").unwrap_or_default(),
            sheets_api_url: env::var("GOOGLE_SHEETS_API_URL")
                .unwrap_or_else(|_| DEFAULT_SHEETS_API_URL.to_string()),
            sheets_timeout: Duration::from_secs(parse_var("VIEWTRACK_SHEETS_TIMEOUT_SECS", 20)?),
            sync_interval_mins: check_interval(parse_var("VIEWTRACK_SYNC_INTERVAL_MINS", 30)?)?,
            sync_concurrency: parse_var("VIEWTRACK_SYNC_CONCURRENCY", 1)?,
        })
    }

    /// True when both the spreadsheet ID and API key are set.
    pub fn sheets_configured(&self) -> bool {
        !self.sheets_spreadsheet_id.is_empty() && !self.sheets_api_key.is_empty()
    }

    /// Background sync period, or None when the timer is disabled.
    pub fn sync_interval(&self) -> Option<Duration> {
        (self.sync_interval_mins > 0)
            .then(|| Duration::from_secs(self.sync_interval_mins.saturating_mul(60)))
    }
}

/// Longest accepted sync interval: one year.
const MAX_SYNC_INTERVAL_MINS: u64 = 365 * 24 * 60;

fn check_interval(mins: u64) -> Result<u64> {
    if mins > MAX_SYNC_INTERVAL_MINS {
        anyhow::bail!(
            "VIEWTRACK_SYNC_INTERVAL_MINS must be at most {MAX_SYNC_INTERVAL_MINS}, got {mins}"
        );
    }
    Ok(mins)
}

/// Read a numeric env var, falling back to `default` when unset.
/// A set-but-unparsable value is an error rather than a silent default.
fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        _ => Ok(default),
    }
}
