// Worksheet parsing — header-driven mapping of cell grids to SourceRows.
//
// The first row names the columns; order doesn't matter and unknown
// columns are ignored. Missing counter columns read as 0.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::traits::{SourceError, SourceRow};
use crate::metrics::{coerce_count, MetricRecord};

#[derive(Debug, Default, PartialEq, Eq)]
struct Columns {
    link: Option<usize>,
    followers: Option<usize>,
    likes: Option<usize>,
    comments: Option<usize>,
    videos: Option<usize>,
    views: Option<usize>,
}

impl Columns {
    fn from_header(header: &[Value]) -> Self {
        let mut columns = Columns::default();
        for (idx, cell) in header.iter().enumerate() {
            let name = cell_text(cell).trim().to_ascii_lowercase().replace(' ', "_");
            let slot = match name.as_str() {
                "link" | "profile_link" | "url" | "profile" => &mut columns.link,
                "followers" | "subscribers" => &mut columns.followers,
                "likes" => &mut columns.likes,
                "comments" => &mut columns.comments,
                "videos" | "posts" => &mut columns.videos,
                "views" => &mut columns.views,
                _ => continue,
            };
            // First matching column wins
            slot.get_or_insert(idx);
        }
        columns
    }
}

/// Turn a worksheet's cell grid into rows. Rows without a link are skipped.
pub fn parse_rows(
    sheet: &str,
    values: &[Vec<Value>],
    observed_at: DateTime<Utc>,
) -> Result<Vec<SourceRow>, SourceError> {
    let Some((header, body)) = values.split_first() else {
        return Err(SourceError::Malformed {
            sheet: sheet.to_string(),
            reason: "no header row".to_string(),
        });
    };

    let columns = Columns::from_header(header);
    let Some(link_col) = columns.link else {
        return Err(SourceError::Malformed {
            sheet: sheet.to_string(),
            reason: "no link column".to_string(),
        });
    };

    let mut rows = Vec::new();
    for (offset, row) in body.iter().enumerate() {
        let link = row.get(link_col).map(cell_text).unwrap_or_default();
        let link = link.trim();
        if link.is_empty() {
            continue;
        }

        // +2: one for the header, one for 1-based sheet rows
        let context = format!("{sheet}!row {}", offset + 2);
        let count = |col: Option<usize>, field: &str| -> u64 {
            col.and_then(|c| row.get(c))
                .map(|cell| coerce_count(&cell_text(cell), field, &context))
                .unwrap_or(0)
        };

        rows.push(SourceRow {
            profile_link: link.to_string(),
            record: MetricRecord {
                followers: count(columns.followers, "followers"),
                likes: count(columns.likes, "likes"),
                comments: count(columns.comments, "comments"),
                videos: count(columns.videos, "videos"),
                views: count(columns.views, "views"),
                observed_at,
            },
        });
    }

    Ok(rows)
}

/// Cells arrive as strings (formatted values) or numbers (unformatted).
fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
