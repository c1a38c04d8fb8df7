//! Error types for the pipeline module.

use std::path::PathBuf;
use thiserror::Error;

use crate::extractor::ExtractorError;
use crate::format::FormatError;
use crate::scanner::ScanError;

/// Errors that stop a batch before any work is dispatched.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Worker count must be positive.
    #[error("max_workers must be at least 1, got {0}")]
    InvalidWorkers(usize),

    /// Candidate discovery failed.
    #[error(transparent)]
    Discovery(#[from] ScanError),

    /// Two candidates in one batch would write the same archive.
    #[error("Duplicate target archive in batch: {path}")]
    DuplicateTarget { path: PathBuf },

    /// Format lookup failed.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Why a single conversion failed. Recorded on the outcome, never
/// propagated past the task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Could not create the working directory.
    #[error("Cannot create working directory: {0}")]
    WorkDir(#[source] std::io::Error),

    /// The extractor failed.
    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    /// Extraction produced no image directory to archive.
    #[error("No images found in {} or {}", primary.display(), fallback.display())]
    NoPayload { primary: PathBuf, fallback: PathBuf },

    /// Writing the archive failed.
    #[error("Packing failed: {0}")]
    Pack(#[from] FormatError),

    /// The task panicked.
    #[error("Task panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_messages() {
        let err = TaskError::NoPayload {
            primary: PathBuf::from("mobi8/OEBPS/Images"),
            fallback: PathBuf::from("mobi7/Images"),
        };
        assert_eq!(
            err.to_string(),
            "No images found in mobi8/OEBPS/Images or mobi7/Images"
        );

        let err = TaskError::from(ExtractorError::Timeout { timeout_secs: 3 });
        assert_eq!(err.to_string(), "Extraction timed out after 3 seconds");

        let err = TaskError::from(FormatError::codec("zip", "disk full"));
        assert_eq!(err.to_string(), "Packing failed: zip codec error: disk full");
    }

    #[test]
    fn test_invalid_workers_message() {
        assert_eq!(
            PipelineError::InvalidWorkers(0).to_string(),
            "max_workers must be at least 1, got 0"
        );
    }
}
