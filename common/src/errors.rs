// Error handling framework
// Humanizing never fails; only document loading, writing and rule
// compilation surface errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid rule pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised by a sync run. Any of these aborts before the tasks
/// document is written.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Document not found: {}", path.display())]
    MissingDocument { path: PathBuf },

    #[error("Failed to parse document {}: {reason}", path.display())]
    UnparseableDocument { path: PathBuf, reason: String },

    #[error("Failed to write document {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Invalid rule configuration: {0}")]
    Rules(#[from] ValidationError),
}

impl SyncError {
    pub fn unparseable(path: &Path, reason: impl ToString) -> Self {
        SyncError::UnparseableDocument {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(path: &Path, reason: impl ToString) -> Self {
        SyncError::WriteFailed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::InvalidCronExpression {
            expression: "* * * *".to_string(),
            reason: "invalid format".to_string(),
        };
        assert!(err.to_string().contains("Invalid cron expression"));
    }

    #[test]
    fn test_missing_document_names_path() {
        let err = SyncError::MissingDocument {
            path: PathBuf::from("data/tasks.json"),
        };
        assert_eq!(err.to_string(), "Document not found: data/tasks.json");
    }

    #[test]
    fn test_validation_error_converts_to_sync_error() {
        let err: SyncError = ValidationError::InvalidPattern {
            pattern: "(".to_string(),
            reason: "unclosed group".to_string(),
        }
        .into();
        assert!(matches!(err, SyncError::Rules(_)));
        assert!(err.to_string().contains("Invalid rule pattern '('"));
    }
}
