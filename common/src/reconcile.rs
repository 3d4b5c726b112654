// Job reconciliation
//
// Rebuilds the board's cron job list from the scheduler's job list. Fields
// published by the scheduler are always taken from it; `hidden` and `project`
// belong to the board and survive as long as a job keeps its name.

use crate::models::{JobRecord, PersistedJobEntry};
use crate::rules::RuleSet;
use chrono_tz::Tz;
use icu_collator::{Collator, CollatorOptions};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Result of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub entries: Vec<PersistedJobEntry>,
    pub report: SyncReport,
}

/// Summary of how the job list changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub previous_count: usize,
    pub current_count: usize,
    /// Names present now but not before, in output order
    pub added: Vec<String>,
    /// Names present before but not now, in first-seen order
    pub removed: Vec<String>,
}

impl SyncReport {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Synced: {} cron jobs (was {})",
            self.current_count, self.previous_count
        )?;
        if !self.added.is_empty() {
            write!(f, "\n  + Added: {}", self.added.join(", "))?;
        }
        if !self.removed.is_empty() {
            write!(f, "\n  - Removed: {}", self.removed.join(", "))?;
        }
        if !self.has_changes() {
            write!(f, "\n  No changes in job list.")?;
        }
        Ok(())
    }
}

/// Merge the scheduler's jobs into the previously persisted entries.
///
/// One-shot jobs are dropped; enabled and disabled recurring jobs are kept.
/// Entries are matched by name. The output is sorted by name.
pub fn reconcile(
    authoritative: &[JobRecord],
    previous: &[PersistedJobEntry],
    rules: &RuleSet,
) -> Reconciliation {
    // last entry wins on duplicate names
    let existing_by_name: HashMap<&str, &PersistedJobEntry> = previous
        .iter()
        .map(|entry| (entry.name.as_str(), entry))
        .collect();

    let mut entries: Vec<PersistedJobEntry> = authoritative
        .iter()
        .filter(|job| {
            if job.is_one_shot() {
                debug!(job_id = %job.id, job_name = %job.name, "Skipping one-shot job");
                return false;
            }
            true
        })
        .map(|job| merge_entry(job, existing_by_name.get(job.name.as_str()).copied(), rules))
        .collect();

    let order = NameOrder::new();
    entries.sort_by(|a, b| order.compare(&a.name, &b.name));

    let added = entries
        .iter()
        .filter(|entry| !existing_by_name.contains_key(entry.name.as_str()))
        .map(|entry| entry.name.clone())
        .collect();

    let current_names: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    let mut seen = HashSet::new();
    let removed = previous
        .iter()
        .map(|entry| entry.name.as_str())
        .filter(|name| !current_names.contains(name) && seen.insert(*name))
        .map(str::to_string)
        .collect();

    let report = SyncReport {
        previous_count: previous.len(),
        current_count: entries.len(),
        added,
        removed,
    };

    Reconciliation { entries, report }
}

fn merge_entry(
    job: &JobRecord,
    existing: Option<&PersistedJobEntry>,
    rules: &RuleSet,
) -> PersistedJobEntry {
    let timezone = job.timezone();
    if Tz::from_str(timezone).is_err() {
        warn!(job_name = %job.name, timezone, "Job timezone is not a known IANA zone");
    }

    let (hidden, project) = match existing {
        Some(entry) => {
            let project = if entry.project.trim().is_empty() {
                rules.default_project().to_string()
            } else {
                entry.project.clone()
            };
            (entry.hidden, project)
        }
        None => {
            let hidden = rules.should_auto_hide(&job.name);
            let project = rules.infer_project(&job.name).to_string();
            debug!(job_name = %job.name, hidden, project = %project, "New job classified");
            (hidden, project)
        }
    };

    PersistedJobEntry {
        id: job.id.clone(),
        name: job.name.clone(),
        schedule: job.expression().to_string(),
        timezone: timezone.to_string(),
        enabled: job.enabled,
        hidden,
        project,
    }
}

/// Job name ordering by the Unicode root collation.
///
/// Accented letters sort next to their base letter and scripts follow the
/// CLDR root order (Latin before Cyrillic). Names the collator considers
/// equal fall back to their exact text so the order is total.
pub struct NameOrder {
    collator: Option<Collator>,
}

impl NameOrder {
    pub fn new() -> Self {
        let collator = match Collator::try_new(&Default::default(), CollatorOptions::new()) {
            Ok(collator) => Some(collator),
            Err(e) => {
                warn!(error = %e, "Root collation unavailable, sorting names case-insensitively");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let collated = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        collated.then_with(|| a.cmp(b))
    }
}

impl Default for NameOrder {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two job names the way reconciled output is sorted
pub fn compare_names(a: &str, b: &str) -> Ordering {
    NameOrder::new().compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleDescriptor, ScheduleKind};

    fn job(id: &str, name: &str, expr: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            name: name.to_string(),
            enabled: true,
            schedule: ScheduleDescriptor {
                kind: ScheduleKind::Cron,
                expr: Some(expr.to_string()),
                tz: None,
            },
        }
    }

    fn entry(name: &str, hidden: bool, project: &str) -> PersistedJobEntry {
        PersistedJobEntry {
            id: format!("old-{}", name),
            name: name.to_string(),
            schedule: "0 9 * * *".to_string(),
            timezone: "UTC".to_string(),
            enabled: true,
            hidden,
            project: project.to_string(),
        }
    }

    fn rules() -> RuleSet {
        RuleSet::builtin().unwrap()
    }

    #[test]
    fn test_new_jobs_use_heuristics() {
        let jobs = [
            job("1", "Nightly backup", "0 3 * * *"),
            job("2", "Spanish learning", "0 8 * * *"),
        ];
        let result = reconcile(&jobs, &[], &rules());

        let backup = &result.entries[0];
        assert_eq!(backup.name, "Nightly backup");
        assert!(backup.hidden);
        assert_eq!(backup.project, "openclaw");
        assert_eq!(backup.timezone, "UTC");

        let learning = &result.entries[1];
        assert!(!learning.hidden);
        assert_eq!(learning.project, "personal");

        assert_eq!(result.report.added, vec!["Nightly backup", "Spanish learning"]);
        assert!(result.report.removed.is_empty());
    }

    #[test]
    fn test_existing_entries_keep_local_fields() {
        let mut changed = job("new-id", "Nightly backup", "30 4 * * *");
        changed.enabled = false;
        changed.schedule.tz = Some("Europe/Moscow".to_string());

        let previous = [entry("Nightly backup", false, "personal")];
        let result = reconcile(&[changed], &previous, &rules());

        let merged = &result.entries[0];
        assert_eq!(merged.id, "new-id");
        assert_eq!(merged.schedule, "30 4 * * *");
        assert_eq!(merged.timezone, "Europe/Moscow");
        assert!(!merged.enabled);
        assert!(!merged.hidden);
        assert_eq!(merged.project, "personal");
        assert!(!result.report.has_changes());
    }

    #[test]
    fn test_empty_timezone_is_stored_as_utc() {
        let mut digest = job("1", "Digest", "0 9 * * *");
        digest.schedule.tz = Some(String::new());

        let result = reconcile(&[digest], &[], &rules());
        assert_eq!(result.entries[0].timezone, "UTC");
    }

    #[test]
    fn test_existing_entry_without_project_gets_default() {
        let result = reconcile(
            &[job("1", "Spanish learning", "0 8 * * *")],
            &[entry("Spanish learning", true, "")],
            &rules(),
        );
        assert_eq!(result.entries[0].project, "openclaw");
        assert!(result.entries[0].hidden);
    }

    #[test]
    fn test_one_shot_jobs_are_dropped() {
        let mut reminder = job("2", "Reminder", "");
        reminder.schedule.kind = ScheduleKind::At;

        let result = reconcile(&[job("1", "Digest", "0 9 * * *"), reminder], &[], &rules());

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].name, "Digest");
    }

    #[test]
    fn test_disabled_recurring_jobs_are_kept() {
        let mut paused = job("1", "Digest", "0 9 * * *");
        paused.enabled = false;
        paused.schedule.kind = ScheduleKind::Every;

        let result = reconcile(&[paused], &[], &rules());
        assert_eq!(result.entries.len(), 1);
        assert!(!result.entries[0].enabled);
    }

    #[test]
    fn test_removed_jobs_are_reported() {
        let previous = vec![
            entry("Digest", false, "openclaw"),
            entry("Old job", false, "personal"),
            entry("Old job", true, "personal"),
        ];
        let result = reconcile(&[job("1", "Digest", "0 9 * * *")], &previous, &rules());

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.report.removed, vec!["Old job"]);
        assert_eq!(result.report.previous_count, 3);
        assert_eq!(result.report.current_count, 1);
    }

    #[test]
    fn test_duplicate_previous_names_last_wins() {
        let previous = vec![entry("Digest", false, "first"), entry("Digest", true, "second")];
        let result = reconcile(&[job("1", "Digest", "0 9 * * *")], &previous, &rules());

        assert!(result.entries[0].hidden);
        assert_eq!(result.entries[0].project, "second");
    }

    #[test]
    fn test_output_sorted_by_name() {
        let result = reconcile(
            &[
                job("1", "beta", "* * * * *"),
                job("2", "Alpha", "* * * * *"),
                job("3", "alpha", "* * * * *"),
                job("4", "Gamma", "* * * * *"),
            ],
            &[],
            &rules(),
        );
        let names: Vec<_> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Alpha", "beta", "Gamma"]);
    }

    #[test]
    fn test_output_sorted_by_collation() {
        let result = reconcile(
            &[
                job("1", "Zebra", "* * * * *"),
                job("2", "жук", "* * * * *"),
                job("3", "Éclair", "* * * * *"),
                job("4", "ёлка", "* * * * *"),
                job("5", "eagle", "* * * * *"),
            ],
            &[],
            &rules(),
        );
        let names: Vec<_> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["eagle", "Éclair", "Zebra", "ёлка", "жук"]);
    }

    #[test]
    fn test_report_display() {
        let report = SyncReport {
            previous_count: 2,
            current_count: 3,
            added: vec!["A".to_string(), "B".to_string()],
            removed: vec!["C".to_string()],
        };
        assert_eq!(
            report.to_string(),
            "Synced: 3 cron jobs (was 2)\n  + Added: A, B\n  - Removed: C"
        );

        let unchanged = SyncReport {
            previous_count: 1,
            current_count: 1,
            ..SyncReport::default()
        };
        assert_eq!(
            unchanged.to_string(),
            "Synced: 1 cron jobs (was 1)\n  No changes in job list."
        );
    }

    #[test]
    fn test_compare_names() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("apple", "Apple"), Ordering::Less);
        assert_eq!(compare_names("Éclair", "Zebra"), Ordering::Less);
        assert_eq!(compare_names("Zebra", "ёлка"), Ordering::Greater);
        assert_eq!(compare_names("same", "same"), Ordering::Equal);
    }
}
