//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while unpacking a source container.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Extractor binary not found.
    #[error("Extractor not found: {command}")]
    ToolNotFound { command: String },

    /// Source file or directory does not exist.
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Extractor exited unsuccessfully. The captured stderr, when present,
    /// is part of the message.
    #[error("Extraction failed: {reason}{}", stderr_suffix(.stderr))]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Extraction timed out.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during extraction.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Creates a new extraction failed error with stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Stderr captured from the extractor, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

/// `": <stderr>"`, or nothing when the tool printed nothing.
pub(crate) fn stderr_suffix(stderr: &Option<String>) -> String {
    match stderr.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!(": {}", text),
        _ => String::new(),
    }
}
