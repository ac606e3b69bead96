// System status display — shows DB stats, project counts, last sync.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;
use crate::sync::load_last_report;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_path: &str) -> Result<()> {
    // Database file size
    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let counts = db.count_projects().await?;
    println!(
        "Projects: {} total, {} active",
        counts.total_projects, counts.active_projects
    );
    if counts.total_projects == 0 {
        println!("  Run `viewtrack add-project <name>` to create one");
    }

    println!("Snapshots: {}", db.count_snapshots().await?);

    match load_last_report(db.as_ref()).await? {
        Some(report) => {
            println!(
                "Last sync: {} ({} ok, {} failed{})",
                report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.success_count,
                report.error_count,
                if report.degraded { ", degraded" } else { "" },
            );
            println!(
                "  Accounts updated: {}, failed: {}, new snapshots: {}",
                report.accounts_updated(),
                report.accounts_failed(),
                report.snapshots_created(),
            );
        }
        None => {
            println!("Last sync: never");
            println!("  Run `viewtrack sync` to pull the latest numbers");
        }
    }

    Ok(())
}

/// Whether a database file exists yet at `db_path`.
pub fn is_initialized(db_path: &str) -> bool {
    Path::new(db_path).exists()
}

/// Print the "not initialized" hint.
pub fn show_uninitialized() {
    println!("Database: not initialized");
    println!("\nRun `{}` to set up the database.", "viewtrack init".bold());
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[tokio::test]
    async fn test_show_with_empty_database() {
        let db = crate::db::open_in_memory().unwrap();
        show(&db, ":memory:").await.unwrap();
    }
}
