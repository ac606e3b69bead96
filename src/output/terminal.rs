// Colored terminal output for sync reports and snapshot history.
//
// This module handles all terminal-specific formatting: colors and tables.
// main.rs and status.rs delegate here.

use colored::Colorize;

use super::{format_count, format_delta, truncate_chars};
use crate::db::models::Snapshot;
use crate::sync::{ProjectSyncResult, SyncReport};

/// Display a sync report as a per-project table plus totals.
pub fn display_report(report: &SyncReport) {
    if report.projects.is_empty() {
        println!("No active projects to sync. Add one with `viewtrack add-project`.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Sync Report ({} projects) ===", report.total_projects).bold()
    );
    println!();

    println!(
        "  {:>4}  {:<24} {:>8} {:>8} {:>7} {:>9}  {}",
        "ID".dimmed(),
        "Project".dimmed(),
        "Accounts".dimmed(),
        "Updated".dimmed(),
        "Failed".dimmed(),
        "Snapshots".dimmed(),
        "Status".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for project in &report.projects {
        let name = project.project_name.as_deref().unwrap_or("?");
        println!(
            "  {:>4}  {:<24} {:>8} {:>8} {:>7} {:>9}  {}",
            project.project_id,
            truncate_chars(name, 21),
            project.accounts_total,
            project.accounts_updated,
            project.accounts_failed,
            project.snapshots_created,
            project_status(project),
        );
        if let Some(reason) = &project.degraded_reason {
            println!("        {}", format!("cache-only: {reason}").dimmed());
        }
        if let Some(error) = &project.error {
            println!("        {}", error.message.red());
        }
    }

    println!();
    println!(
        "  Projects: {} ok, {} failed",
        report.success_count.to_string().green(),
        if report.error_count > 0 {
            report.error_count.to_string().red()
        } else {
            report.error_count.to_string().normal()
        },
    );
    println!(
        "  Accounts updated: {}  failed: {}  new snapshots: {}",
        report.accounts_updated(),
        report.accounts_failed(),
        report.snapshots_created(),
    );
    if report.degraded {
        println!(
            "  {} external source unavailable for some projects, local values kept",
            "Warning:".yellow()
        );
    }
    println!(
        "  {}",
        format!("Generated {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")).dimmed()
    );
}

fn project_status(project: &ProjectSyncResult) -> String {
    if project.error.is_some() {
        "error".red().bold().to_string()
    } else if project.degraded {
        "degraded".yellow().to_string()
    } else if project.accounts_failed > 0 {
        "partial".yellow().to_string()
    } else {
        "ok".green().to_string()
    }
}

/// Display an account's daily snapshots, newest first, with day-over-day view growth.
pub fn display_history(account_id: i64, snapshots: &[Snapshot]) {
    if snapshots.is_empty() {
        println!("No snapshots recorded for account {account_id} yet. Run `viewtrack sync` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== History for account {account_id} ({} days) ===", snapshots.len()).bold()
    );
    println!();
    println!(
        "  {:<10}  {:>12} {:>12} {:>10} {:>7} {:>14} {:>12}",
        "Day".dimmed(),
        "Followers".dimmed(),
        "Likes".dimmed(),
        "Comments".dimmed(),
        "Videos".dimmed(),
        "Views".dimmed(),
        "Δ Views".dimmed(),
    );
    println!("  {}", "-".repeat(86).dimmed());

    for (i, snapshot) in snapshots.iter().enumerate() {
        let m = &snapshot.metrics;
        // Rows are newest first, so the previous day is the next row
        let delta = match snapshots.get(i + 1) {
            Some(prev) => {
                let d = format_delta(m.views, prev.metrics.views);
                if m.views > prev.metrics.views {
                    d.green().to_string()
                } else {
                    d.dimmed().to_string()
                }
            }
            None => "".to_string(),
        };
        println!(
            "  {:<10}  {:>12} {:>12} {:>10} {:>7} {:>14} {:>12}",
            snapshot.snapshot_date.format("%Y-%m-%d").to_string(),
            format_count(m.followers),
            format_count(m.likes),
            format_count(m.comments),
            format_count(m.videos),
            format_count(m.views),
            delta,
        );
    }
}
