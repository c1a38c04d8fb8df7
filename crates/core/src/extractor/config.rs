//! Configuration for the extractor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::PayloadLayout;

/// Configuration for the external container extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Extractor executable, looked up on `PATH` unless it contains a separator.
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments; `{input}` and `{output}` are replaced by the source file
    /// and the working directory.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Timeout for a single extraction in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Preferred image directory, relative to the extraction root.
    #[serde(default = "default_primary_payload")]
    pub primary_payload: PathBuf,

    /// Image directory used when the preferred one is missing or empty.
    #[serde(default = "default_fallback_payload")]
    pub fallback_payload: PathBuf,
}

fn default_command() -> String {
    "mobiunpack".to_string()
}

fn default_args() -> Vec<String> {
    vec!["{input}".to_string(), "{output}".to_string()]
}

fn default_timeout() -> u64 {
    600 // 10 minutes
}

fn default_primary_payload() -> PathBuf {
    PathBuf::from("mobi8/OEBPS/Images")
}

fn default_fallback_payload() -> PathBuf {
    PathBuf::from("mobi7/Images")
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            timeout_secs: default_timeout(),
            primary_payload: default_primary_payload(),
            fallback_payload: default_fallback_payload(),
        }
    }
}

impl ExtractorConfig {
    /// Sets the extractor command.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Sets the extractor arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Payload directories to look for after extraction.
    pub fn payload_layout(&self) -> PayloadLayout {
        PayloadLayout {
            primary: self.primary_payload.clone(),
            fallback: self.fallback_payload.clone(),
        }
    }
}
