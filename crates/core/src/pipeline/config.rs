//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for batch execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of conversions running at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Parent of the per-task working directories.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_max_workers() -> usize {
    4
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("archivist")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            temp_dir: default_temp_dir(),
        }
    }
}

impl PipelineConfig {
    /// Sets the worker count.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the working directory parent.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_workers, 4);
        assert!(config.temp_dir.ends_with("archivist"));
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default()
            .with_max_workers(8)
            .with_temp_dir("/var/tmp/conv");
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.temp_dir, PathBuf::from("/var/tmp/conv"));
    }
}
