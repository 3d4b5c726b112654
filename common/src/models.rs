use serde::{Deserialize, Serialize};

/// Timezone assumed when a job does not carry one
pub const DEFAULT_TIMEZONE: &str = "UTC";

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

// ============================================================================
// Authoritative job models (scheduler side)
// ============================================================================

/// ScheduleKind discriminates recurring schedules from one-shot ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    #[default]
    Cron,
    Every,
    /// Fires once at a fixed instant
    At,
    #[serde(other)]
    Unknown,
}

impl ScheduleKind {
    pub fn is_one_shot(&self) -> bool {
        matches!(self, ScheduleKind::At)
    }
}

/// ScheduleDescriptor is the `schedule` object of an authoritative job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScheduleDescriptor {
    #[serde(default)]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
}

/// JobRecord is a job definition as published by the scheduler.
/// Fields the board does not use are ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub schedule: ScheduleDescriptor,
}

impl JobRecord {
    pub fn is_one_shot(&self) -> bool {
        self.schedule.kind.is_one_shot()
    }

    /// Cron expression, empty when the scheduler did not supply one
    pub fn expression(&self) -> &str {
        self.schedule.expr.as_deref().unwrap_or_default()
    }

    pub fn timezone(&self) -> &str {
        self.schedule
            .tz
            .as_deref()
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or(DEFAULT_TIMEZONE)
    }
}

// ============================================================================
// Persisted board models
// ============================================================================

/// PersistedJobEntry is a cron job as stored on the task board.
///
/// `hidden` and `project` are owned by the board; every other field is
/// overwritten from the scheduler on each sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedJobEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(rename = "tz", alias = "timezone", default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub project: String,
}
