// HTTP client for the Google Sheets v4 values API.
//
// Reads one worksheet per project with
// `GET /v4/spreadsheets/{id}/values/{range}?key=...`. The worksheet is named
// after the project, so the range is `'<project name>'!A:Z`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::parse::parse_rows;
use super::traits::{MetricSource, SourceError, SourceRow};

/// Default Sheets API endpoint.
pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Response body of `spreadsheets.values.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: Option<String>,
    pub major_dimension: Option<String>,
    /// Omitted entirely by the API when the range is empty.
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

/// API-key authenticated client for a single spreadsheet.
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    api_key: String,
}

impl SheetsClient {
    pub fn new(
        base_url: &str,
        spreadsheet_id: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("viewtrack/0.1 (metrics-sync)")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build the values URL for a worksheet. Segments are percent-encoded,
    /// so sheet names with spaces or slashes are safe.
    pub fn values_url(&self, sheet: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            SourceError::NotConfigured(format!("invalid Sheets API URL {:?}: {e}", self.base_url))
        })?;

        let range = sheet_range(sheet);
        url.path_segments_mut()
            .map_err(|_| {
                SourceError::NotConfigured(format!(
                    "Sheets API URL {:?} cannot be a base",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("majorDimension", "ROWS");

        Ok(url)
    }

    /// Fetch the raw cell grid for a worksheet.
    pub async fn fetch_values(&self, sheet: &str) -> Result<ValueRange, SourceError> {
        let url = self.values_url(sheet)?;

        debug!(sheet, "Sheets values GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("request for {sheet:?} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Covers bad keys and missing worksheets too; both come back as 400
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!(
                "Sheets API returned {status} for {sheet:?}: {body}"
            )));
        }

        response
            .json::<ValueRange>()
            .await
            .map_err(|e| SourceError::Unavailable(format!("unreadable response for {sheet:?}: {e}")))
    }
}

#[async_trait]
impl MetricSource for SheetsClient {
    async fn read_accounts(&self, project_name: &str) -> Result<Vec<SourceRow>, SourceError> {
        let values = self.fetch_values(project_name).await?;
        let rows = parse_rows(project_name, &values.values, Utc::now())?;
        debug!(sheet = project_name, rows = rows.len(), "Sheet rows parsed");
        Ok(rows)
    }
}

/// A1 range covering the whole worksheet. Single quotes in the name are
/// doubled, per Sheets quoting rules.
pub fn sheet_range(sheet: &str) -> String {
    format!("'{}'!A:Z", sheet.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SheetsClient {
        SheetsClient::new(base, "sheet123", "key456", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_sheet_range_quotes_name() {
        assert_eq!(sheet_range("Launch"), "'Launch'!A:Z");
        assert_eq!(sheet_range("Bob's Promo"), "'Bob''s Promo'!A:Z");
    }

    #[test]
    fn test_values_url_shape() {
        let url = client(DEFAULT_SHEETS_API_URL).values_url("Launch").unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("key".to_string(), "key456".to_string())));
        assert!(pairs.contains(&("majorDimension".to_string(), "ROWS".to_string())));
    }

    #[test]
    fn test_values_url_encodes_sheet_name() {
        let url = client("https://sheets.googleapis.com/")
            .values_url("Spring Launch / EU")
            .unwrap();
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        // The slash in the name must not create an extra path segment
        assert_eq!(segments.len(), 5);
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_values_url_rejects_bad_base() {
        let result = client("not a url").values_url("Launch");
        assert!(matches!(result, Err(SourceError::NotConfigured(_))));
    }

    #[test]
    fn test_deserialize_value_range() {
        let json = r#"{
            "range": "'Launch'!A1:Z3",
            "majorDimension": "ROWS",
            "values": [["link", "views"], ["https://tiktok.com/@a", "10"]]
        }"#;
        let body: ValueRange = serde_json::from_str(json).unwrap();
        assert_eq!(body.major_dimension.as_deref(), Some("ROWS"));
        assert_eq!(body.values.len(), 2);
    }

    #[test]
    fn test_deserialize_empty_range_omits_values() {
        let json = r#"{"range": "'Empty'!A1:Z1000", "majorDimension": "ROWS"}"#;
        let body: ValueRange = serde_json::from_str(json).unwrap();
        assert!(body.values.is_empty());
    }

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn stub_server(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_bad_request_is_unavailable() {
        // What the API answers for an invalid key or a missing worksheet
        let base = stub_server("400 Bad Request", r#"{"error":{"code":400}}"#).await;
        let result = client(&base).read_accounts("Launch").await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_not_found_is_unavailable() {
        let base = stub_server("404 Not Found", "{}").await;
        let result = client(&base).read_accounts("Launch").await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let base = stub_server("500 Internal Server Error", "{}").await;
        let result = client(&base).read_accounts("Launch").await;
        match result {
            Err(SourceError::Unavailable(reason)) => assert!(reason.contains("500")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreadable_body_is_unavailable() {
        let base = stub_server("200 OK", "<html>not json</html>").await;
        let result = client(&base).read_accounts("Launch").await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_sheet_without_link_column_is_malformed() {
        let base = stub_server("200 OK", r#"{"values":[["Views"],["10"]]}"#).await;
        let result = client(&base).read_accounts("Launch").await;
        assert!(matches!(result, Err(SourceError::Malformed { .. })), "{result:?}");
    }

    #[tokio::test]
    async fn test_rows_come_back_from_sheet() {
        let base = stub_server(
            "200 OK",
            r#"{"values":[["Profile link","Views"],["https://tiktok.com/@a","1.2K"]]}"#,
        )
        .await;
        let rows = client(&base).read_accounts("Launch").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.views, 1_200);
    }

    #[tokio::test]
    async fn test_closed_port_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let result = client(&format!("http://{addr}")).read_accounts("Launch").await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))), "{result:?}");
    }
}
