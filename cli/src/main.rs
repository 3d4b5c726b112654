// Taskboard binary entry point
//
// `sync` refreshes the board's cron jobs from the scheduler's job list;
// `show` prints the persisted cron jobs with readable schedules.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use common::config::Settings;
use common::document::TasksDocument;
use common::schedule::{humanize, next_run};
use common::sync::{SyncOptions, SyncService};
use common::telemetry::init_logging;
use std::path::PathBuf;
use tracing::{error, info};

/// Taskboard CLI.
#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Cron job board: sync scheduler jobs and show schedules")]
#[command(version)]
struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = "config", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the scheduler's job list into the board document
    Sync {
        /// Scheduler jobs.json
        #[arg(long, env = "TASKBOARD_JOBS_FILE")]
        jobs: Option<PathBuf>,

        /// Board tasks.json
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// Report changes without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// List cron jobs on the board
    Show {
        /// Board tasks.json
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// Include hidden jobs
        #[arg(long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_logging(
        &settings.observability.log_level,
        settings.observability.json_logs,
    )?;

    let outcome = match cli.command {
        Commands::Sync {
            jobs,
            tasks,
            dry_run,
        } => run_sync(&settings, jobs, tasks, dry_run),
        Commands::Show { tasks, all } => run_show(&settings, tasks, all),
    };

    if let Err(e) = &outcome {
        error!(error = %e, "Command failed");
    }
    outcome
}

fn run_sync(
    settings: &Settings,
    jobs: Option<PathBuf>,
    tasks: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let service =
        SyncService::from_config(&settings.rules).context("Failed to compile job rules")?;
    let options = SyncOptions {
        jobs_file: jobs.unwrap_or_else(|| settings.paths.jobs_file.clone()),
        tasks_file: tasks.unwrap_or_else(|| settings.paths.tasks_file.clone()),
        dry_run,
    };

    info!(
        jobs_file = %options.jobs_file.display(),
        tasks_file = %options.tasks_file.display(),
        "Starting cron sync"
    );

    let report = service.run(&options).context("Cron sync failed")?;

    println!("{}", report);
    Ok(())
}

fn run_show(settings: &Settings, tasks: Option<PathBuf>, all: bool) -> Result<()> {
    let tasks_file = tasks.unwrap_or_else(|| settings.paths.tasks_file.clone());
    let document = TasksDocument::load(&tasks_file)?;
    let entries = document
        .cron_jobs()
        .with_context(|| format!("Invalid cron jobs in {}", tasks_file.display()))?;

    let now = Utc::now();
    let mut shown = 0;
    for entry in entries.iter().filter(|e| all || !e.hidden) {
        let timezone = Some(entry.timezone.as_str());
        let status = if entry.enabled { "enabled" } else { "disabled" };
        let next = match (entry.enabled, next_run(&entry.schedule, timezone, now)) {
            (true, Some(at)) => at.format("%Y-%m-%d %H:%M UTC").to_string(),
            _ => "-".to_string(),
        };
        let marker = if entry.hidden { " (hidden)" } else { "" };

        println!("{}{} [{}] {}", entry.name, marker, entry.project, status);
        println!("    {}", humanize(&entry.schedule, timezone));
        println!("    next: {}", next);
        shown += 1;
    }

    println!("{} of {} cron jobs shown", shown, entries.len());
    Ok(())
}
