// Sync pipeline: load both documents, reconcile, write the board document
//
// Both documents are loaded and validated before anything is written, so a
// failed run leaves the board document untouched.

use crate::config::RulesConfig;
use crate::document::{JobsDocument, TasksDocument};
use crate::errors::SyncError;
use crate::reconcile::{reconcile, SyncReport};
use crate::rules::RuleSet;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Inputs of a single sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub jobs_file: PathBuf,
    pub tasks_file: PathBuf,
    /// Compute the report without writing the board document
    pub dry_run: bool,
}

/// Runs reconciliations against documents on disk
pub struct SyncService {
    rules: RuleSet,
}

impl SyncService {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Build a service from configured rule tables
    pub fn from_config(config: &RulesConfig) -> Result<Self, SyncError> {
        Ok(Self::new(RuleSet::compile(config)?))
    }

    #[instrument(
        skip(self, options),
        fields(
            jobs_file = %options.jobs_file.display(),
            tasks_file = %options.tasks_file.display(),
            dry_run = options.dry_run
        )
    )]
    pub fn run(&self, options: &SyncOptions) -> Result<SyncReport, SyncError> {
        let jobs = JobsDocument::load(&options.jobs_file)?;
        let mut tasks = TasksDocument::load(&options.tasks_file)?;
        let previous = tasks
            .cron_jobs()
            .map_err(|e| SyncError::unparseable(&options.tasks_file, e))?;

        let result = reconcile(&jobs.jobs, &previous, &self.rules);

        info!(
            previous = result.report.previous_count,
            current = result.report.current_count,
            added = result.report.added.len(),
            removed = result.report.removed.len(),
            "Reconciled cron jobs"
        );

        if options.dry_run {
            info!("Dry run, tasks document not written");
            return Ok(result.report);
        }

        tasks
            .set_cron_jobs(&result.entries)
            .map_err(|e| SyncError::write_failed(&options.tasks_file, e))?;
        tasks.save(&options.tasks_file)?;

        Ok(result.report)
    }
}
