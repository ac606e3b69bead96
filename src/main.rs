use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

use viewtrack::config::Config;
use viewtrack::db::models::NewProject;
use viewtrack::db::Database;
use viewtrack::metrics::ProfileLink;
use viewtrack::sync::{SyncTarget, Syncer};

/// Viewtrack: keep campaign account metrics in step with the tracking sheet.
///
/// Merges the operators' Google Sheet with the local cache (taking the
/// larger value per counter) and records one snapshot per account per day.
#[derive(Parser)]
#[command(name = "viewtrack", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Create a project (its sheet tab must use the same name)
    AddProject {
        /// Project name, matching the worksheet title
        name: String,

        /// Campaign view target
        #[arg(long, default_value = "0")]
        target_views: u64,

        /// Campaign start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Campaign end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Add a profile link to a project
    AddAccount {
        /// Project ID (see `viewtrack status`)
        project_id: i64,

        /// Profile URL, e.g. https://www.tiktok.com/@someone
        link: String,
    },

    /// Pause or resume a project
    SetActive {
        project_id: i64,

        /// true to include the project in syncs, false to skip it
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },

    /// Run a sync now
    Sync {
        /// Only sync this project (default: all active projects)
        #[arg(long)]
        project: Option<i64>,
    },

    /// Show system status (projects, snapshots, last sync)
    Status,

    /// Show an account's daily snapshots
    History {
        account_id: i64,

        /// Number of days to show (default: 30)
        #[arg(long, default_value = "30")]
        limit: u32,
    },

    /// Delete all snapshot history (resets growth baselines)
    ClearHistory {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Start the HTTP trigger surface and the periodic sync timer
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 8080)
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Address to bind (default: 127.0.0.1)
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("viewtrack=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Viewtrack database...");
            let config = Config::load()?;
            let db = viewtrack::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            if !config.sheets_configured() {
                println!(
                    "\n{}",
                    "Google Sheets is not configured; syncs will use local values only.".yellow()
                );
                println!("  Set GOOGLE_SHEETS_SPREADSHEET_ID and GOOGLE_SHEETS_API_KEY in .env");
            }
            println!("\nNext: viewtrack add-project <name>");
        }

        Commands::AddProject {
            name,
            target_views,
            start,
            end,
        } => {
            if let (Some(start), Some(end)) = (start, end) {
                if end < start {
                    anyhow::bail!("--end ({end}) is before --start ({start})");
                }
            }
            let config = Config::load()?;
            let db = viewtrack::db::open_sqlite(&config.db_path)?;
            let id = db
                .insert_project(&NewProject {
                    name: name.clone(),
                    target_views,
                    start_date: start,
                    end_date: end,
                })
                .await?;
            println!("Project {} created: {}", id.to_string().bold(), name);
        }

        Commands::AddAccount { project_id, link } => {
            let config = Config::load()?;
            let db = viewtrack::db::open_sqlite(&config.db_path)?;
            if db.get_project(project_id).await?.is_none() {
                anyhow::bail!("Project {project_id} not found");
            }
            let link = ProfileLink::parse(&link)?;
            let id = db.insert_account(project_id, &link).await?;
            println!(
                "Account {} added: {} ({}{})",
                id.to_string().bold(),
                link.canonical,
                link.platform,
                link.username
                    .as_deref()
                    .map(|u| format!(", @{u}"))
                    .unwrap_or_default(),
            );
        }

        Commands::SetActive { project_id, active } => {
            let config = Config::load()?;
            let db = viewtrack::db::open_sqlite(&config.db_path)?;
            if !db.set_project_active(project_id, active).await? {
                anyhow::bail!("Project {project_id} not found");
            }
            println!(
                "Project {project_id} is now {}",
                if active { "active" } else { "paused" }
            );
        }

        Commands::Sync { project } => {
            let config = Config::load()?;
            let db = viewtrack::db::open_sqlite(&config.db_path)?;
            let syncer = build_syncer(&config, db)?;

            let report = syncer.run(SyncTarget::from(project)).await?;
            viewtrack::output::terminal::display_report(&report);

            if let Some(missing) = report.projects.iter().find(|p| p.is_not_found()) {
                anyhow::bail!("Project {} not found or inactive", missing.project_id);
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            if !viewtrack::status::is_initialized(&config.db_path) {
                viewtrack::status::show_uninitialized();
                return Ok(());
            }
            let db = viewtrack::db::open_sqlite(&config.db_path)?;
            viewtrack::status::show(&db, &config.db_path).await?;
        }

        Commands::History { account_id, limit } => {
            let config = Config::load()?;
            let db = viewtrack::db::open_sqlite(&config.db_path)?;
            let snapshots = db.list_snapshots(account_id, limit).await?;
            viewtrack::output::terminal::display_history(account_id, &snapshots);
        }

        Commands::ClearHistory { yes } => {
            let config = Config::load()?;
            let db = viewtrack::db::open_sqlite(&config.db_path)?;
            if !yes {
                let count = db.count_snapshots().await?;
                println!(
                    "This deletes all {count} snapshots and resets growth tracking.\n\
                     Re-run with {} to confirm.",
                    "--yes".bold()
                );
                return Ok(());
            }
            let removed = db.clear_snapshots().await?;
            println!("Removed {removed} snapshots.");
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            let db = viewtrack::db::initialize_sqlite(&config.db_path)?;
            let syncer = Arc::new(build_syncer(&config, db.clone())?);
            viewtrack::web::run_server(config, db, syncer, port, &bind).await?;
        }
    }

    Ok(())
}

/// Wire the configured source and concurrency into a Syncer.
fn build_syncer(config: &Config, db: Arc<dyn Database>) -> Result<Syncer> {
    let source = viewtrack::sheets::build_source(config)?;
    Ok(Syncer::new(db, source).with_concurrency(config.sync_concurrency))
}
