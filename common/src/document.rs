// JSON documents read and written by a sync run
//
// The scheduler's job list is read-only. The board document is an arbitrary
// JSON object; only its `cronJobs` key is ever replaced.

use crate::errors::SyncError;
use crate::models::{JobRecord, PersistedJobEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Key under which the board stores its cron jobs
pub const CRON_JOBS_KEY: &str = "cronJobs";

fn read_document(path: &Path) -> Result<String, SyncError> {
    if !path.exists() {
        return Err(SyncError::MissingDocument {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|e| SyncError::unparseable(path, e))
}

/// The scheduler's job list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsDocument {
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
}

impl JobsDocument {
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let raw = read_document(path)?;
        let document: JobsDocument =
            serde_json::from_str(&raw).map_err(|e| SyncError::unparseable(path, e))?;
        debug!(jobs = document.jobs.len(), "Loaded scheduler jobs");
        Ok(document)
    }
}

/// The task board document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TasksDocument {
    root: Map<String, Value>,
}

impl TasksDocument {
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let raw = read_document(path)?;
        let document = Self::parse(&raw).map_err(|reason| SyncError::unparseable(path, reason))?;
        debug!(keys = document.root.len(), "Loaded tasks document");
        Ok(document)
    }

    /// Parse a board document; the root must be a JSON object and `cronJobs`,
    /// when present, must hold valid entries.
    pub fn parse(raw: &str) -> Result<Self, String> {
        match serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())? {
            Value::Object(root) => {
                let document = Self { root };
                document.cron_jobs().map_err(|e| e.to_string())?;
                Ok(document)
            }
            other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        }
    }

    /// Persisted cron jobs; a document without `cronJobs` has none
    pub fn cron_jobs(&self) -> Result<Vec<PersistedJobEntry>, serde_json::Error> {
        match self.root.get(CRON_JOBS_KEY) {
            Some(value) if !value.is_null() => Vec::<PersistedJobEntry>::deserialize(value),
            _ => Ok(Vec::new()),
        }
    }

    /// Replace `cronJobs`, keeping its position and every other key as is
    pub fn set_cron_jobs(&mut self, entries: &[PersistedJobEntry]) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(entries)?;
        self.root.insert(CRON_JOBS_KEY.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Pretty JSON with two-space indentation and a trailing newline
    pub fn to_pretty_string(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(&self.root)?;
        out.push('\n');
        Ok(out)
    }

    /// Write the document through a uniquely named temporary file in the
    /// same directory that is then renamed over `path`, so readers see
    /// either the old or the new document.
    #[instrument(skip(self))]
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let contents = self
            .to_pretty_string()
            .map_err(|e| SyncError::write_failed(path, e))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SyncError::write_failed(path, e))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| SyncError::write_failed(path, e))?;
        // the temp file is removed on drop if persisting fails
        tmp.persist(path)
            .map_err(|e| SyncError::write_failed(path, e.error))?;

        info!(bytes = contents.len(), "Tasks document written");
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
