//! Types for the pipeline module.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::PipelineError;
use crate::format::ArchiveFormat;

/// One unit of work: a source and the archive it should become.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Container file or directory to convert.
    pub source_path: PathBuf,
    /// Archive to write.
    pub target_archive_path: PathBuf,
    /// Format of the archive.
    pub format: ArchiveFormat,
}

impl Candidate {
    /// Candidate for a container file; the archive replaces its extension.
    pub fn for_file(source: &Path, format: ArchiveFormat) -> Self {
        Self {
            source_path: source.to_path_buf(),
            target_archive_path: format.target_for_file(source),
            format,
        }
    }

    /// Candidate for a directory; the archive is named after it.
    pub fn for_directory(dir: &Path, format: ArchiveFormat) -> Self {
        Self {
            source_path: dir.to_path_buf(),
            target_archive_path: format.target_for_directory(dir),
            format,
        }
    }
}

/// Final status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

/// Lifecycle of a task: `Pending -> Running -> Succeeded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Whether the task has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

impl From<TaskStatus> for TaskState {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Succeeded => Self::Succeeded,
            TaskStatus::Failed => Self::Failed,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of one task. Created once, never modified.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub candidate: Candidate,
    pub status: TaskStatus,
    /// Failure description; `None` on success.
    pub error: Option<String>,
    pub elapsed: Duration,
    /// Size of the written archive on success.
    pub archive_size: Option<u64>,
    /// Working directory removal problem. Does not affect `status`.
    pub cleanup_warning: Option<String>,
}

impl TaskOutcome {
    /// A successful outcome.
    pub fn succeeded(candidate: Candidate, archive_size: u64, elapsed: Duration) -> Self {
        Self {
            candidate,
            status: TaskStatus::Succeeded,
            error: None,
            elapsed,
            archive_size: Some(archive_size),
            cleanup_warning: None,
        }
    }

    /// A failed outcome.
    pub fn failed(candidate: Candidate, error: impl ToString, elapsed: Duration) -> Self {
        Self {
            candidate,
            status: TaskStatus::Failed,
            error: Some(error.to_string()),
            elapsed,
            archive_size: None,
            cleanup_warning: None,
        }
    }

    /// Attaches a cleanup warning.
    pub fn with_cleanup_warning(mut self, warning: Option<String>) -> Self {
        self.cleanup_warning = warning;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }
}

/// Candidates submitted together, with distinct target archives.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    candidates: Vec<Candidate>,
}

impl Batch {
    /// Builds a batch, rejecting two candidates with the same target.
    pub fn new(candidates: Vec<Candidate>) -> Result<Self, PipelineError> {
        let mut seen = HashSet::new();
        for candidate in &candidates {
            if !seen.insert(candidate.target_archive_path.as_path()) {
                return Err(PipelineError::DuplicateTarget {
                    path: candidate.target_archive_path.clone(),
                });
            }
        }
        Ok(Self { candidates })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}

impl IntoIterator for Batch {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}
