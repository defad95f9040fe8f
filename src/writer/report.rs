use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Result of attempting to write one extracted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Updated,
    SkippedExists,
    SkippedEmptyPath,
    SkippedNoContent,
    RejectedPathEscape,
    FailedPermission(String),
    FailedOsError(String),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Created | WriteOutcome::Updated)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            WriteOutcome::SkippedExists
                | WriteOutcome::SkippedEmptyPath
                | WriteOutcome::SkippedNoContent
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            WriteOutcome::RejectedPathEscape
                | WriteOutcome::FailedPermission(_)
                | WriteOutcome::FailedOsError(_)
        )
    }

    pub fn level(&self) -> StatusLevel {
        if self.is_written() {
            StatusLevel::Success
        } else if self.is_skipped() {
            StatusLevel::Warning
        } else {
            StatusLevel::Error
        }
    }

    pub fn describe(&self, path: &str) -> String {
        match self {
            WriteOutcome::Created => format!("Created: {}", path),
            WriteOutcome::Updated => format!("Updated: {}", path),
            WriteOutcome::SkippedExists => format!("Skipped (exists): {}", path),
            WriteOutcome::SkippedEmptyPath => "Skipping empty filepath".to_string(),
            WriteOutcome::SkippedNoContent => format!("Skipping {}: no content", path),
            WriteOutcome::RejectedPathEscape => {
                format!("Security: {} attempts to escape the project directory", path)
            }
            WriteOutcome::FailedPermission(detail) => {
                format!("Permission denied: {} ({})", path, detail)
            }
            WriteOutcome::FailedOsError(detail) => {
                format!("OS error creating {}: {}", path, detail)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
}

/// Receives one status line per processed record.
pub trait StatusSink {
    fn emit(&self, line: &StatusLine);
}

impl<F> StatusSink for F
where
    F: Fn(&StatusLine),
{
    fn emit(&self, line: &StatusLine) {
        self(line)
    }
}

/// Collects status lines in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    lines: RefCell<Vec<StatusLine>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<StatusLine> {
        self.lines.borrow().clone()
    }
}

impl StatusSink for CollectingSink {
    fn emit(&self, line: &StatusLine) {
        self.lines.borrow_mut().push(line.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteEntry {
    pub path: String,
    pub resolved_path: Option<PathBuf>,
    pub outcome: WriteOutcome,
}

impl WriteEntry {
    pub fn status_line(&self) -> StatusLine {
        StatusLine {
            level: self.outcome.level(),
            message: self.outcome.describe(&self.path),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteReport {
    pub base_directory: PathBuf,
    pub entries: Vec<WriteEntry>,
    /// Absolute paths of files created or updated, in write order.
    pub written: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled: bool,
}

impl WriteReport {
    pub fn new(base_directory: PathBuf) -> Self {
        Self {
            base_directory,
            entries: Vec::new(),
            written: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            cancelled: false,
        }
    }

    pub fn record(&mut self, entry: WriteEntry) {
        if entry.outcome.is_written() {
            if let Some(ref resolved) = entry.resolved_path {
                self.written.push(resolved.clone());
            }
        }
        self.entries.push(entry);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
        self.finish();
    }

    pub fn created_count(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Created))
    }

    pub fn updated_count(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Updated))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(WriteOutcome::is_skipped)
    }

    pub fn failed_count(&self) -> usize {
        self.count(WriteOutcome::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    pub fn outcome_for(&self, path: &str) -> Option<&WriteOutcome> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| &e.outcome)
    }

    pub fn written_paths(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn display_summary(&self) -> String {
        format!(
            "{} created, {} updated, {} skipped, {} failed",
            self.created_count(),
            self.updated_count(),
            self.skipped_count(),
            self.failed_count()
        )
    }

    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&WriteOutcome) -> bool,
    {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }
}
