//! Optional codec detection.

use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use super::config::CodecConfig;

/// Binaries tried, in order, when no 7-Zip path is configured.
pub const DEFAULT_SEVENZIP_BINARIES: &[&str] = &["7zz", "7z", "7za"];

/// How long a candidate binary may take to print its banner.
pub const DETECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A usable 7-Zip executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SevenZipTool {
    /// Binary to execute.
    pub path: PathBuf,
    /// Version from the banner, when it could be parsed.
    pub version: Option<String>,
}

/// Optional codecs detected on this system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecCapabilities {
    /// 7-Zip support, if a binary answered.
    pub sevenzip: Option<SevenZipTool>,
}

impl CodecCapabilities {
    /// Detect optional codecs by running their binaries.
    ///
    /// A configured path is the only candidate; otherwise the well-known
    /// binary names are tried on `PATH`.
    pub async fn detect(config: &CodecConfig) -> Self {
        let candidates: Vec<PathBuf> = match &config.sevenzip_path {
            Some(path) => vec![path.clone()],
            None => DEFAULT_SEVENZIP_BINARIES
                .iter()
                .map(PathBuf::from)
                .collect(),
        };

        for candidate in candidates {
            if let Some(tool) = query_sevenzip(&candidate, DETECT_TIMEOUT).await {
                return Self {
                    sevenzip: Some(tool),
                };
            }
        }

        Self::default()
    }

    /// Check if 7-Zip is available.
    pub fn has_sevenzip(&self) -> bool {
        self.sevenzip.is_some()
    }
}

async fn query_sevenzip(path: &Path, limit: Duration) -> Option<SevenZipTool> {
    // Without arguments 7-Zip prints its banner and usage.
    let child = Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .ok()?;

    // Dropping the child on timeout kills it.
    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.ok()?,
        Err(_) => {
            warn!(
                path = %path.display(),
                timeout_secs = limit.as_secs(),
                "7-Zip binary did not answer in time, ignoring it"
            );
            return None;
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("7-Zip") {
        return None;
    }

    Some(SevenZipTool {
        path: path.to_path_buf(),
        version: parse_sevenzip_version(&stdout),
    })
}

/// Extracts the version from a banner such as `7-Zip [64] 16.02 : Copyright`
/// or `7-Zip (z) 23.01 (x64)`.
pub fn parse_sevenzip_version(banner: &str) -> Option<String> {
    let re = Regex::new(r"7-Zip(?:\s+(?:\[\d+\]|\(\w+\)))*\s+(\d+\.\d+)").ok()?;
    re.captures(banner)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
