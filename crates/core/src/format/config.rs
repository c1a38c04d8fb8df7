//! Configuration for archive codecs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Codec configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Explicit path to a 7-Zip binary. When unset, `7zz`, `7z` and `7za`
    /// are tried on `PATH`.
    #[serde(default)]
    pub sevenzip_path: Option<PathBuf>,

    /// Deflate level for zip archives (0-9). Codec default when unset.
    #[serde(default)]
    pub zip_compression_level: Option<u32>,
}

impl CodecConfig {
    /// Sets the 7-Zip binary path.
    pub fn with_sevenzip_path(mut self, path: PathBuf) -> Self {
        self.sevenzip_path = Some(path);
        self
    }

    /// Sets the zip compression level.
    pub fn with_zip_level(mut self, level: u32) -> Self {
        self.zip_compression_level = Some(level);
        self
    }
}
