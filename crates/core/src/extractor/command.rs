//! Extractor that runs an external unpacking tool.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::traits::Extractor;
use super::types::{Extraction, PayloadLayout};

/// Runs the configured tool once per source, writing into the task's
/// working directory.
pub struct CommandExtractor {
    config: ExtractorConfig,
}

impl CommandExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Creates an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Expands `{input}` and `{output}` in the configured arguments.
    fn build_args(&self, source: &Path, work_dir: &Path) -> Vec<OsString> {
        self.config
            .args
            .iter()
            .map(|arg| match arg.as_str() {
                "{input}" => source.as_os_str().to_owned(),
                "{output}" => work_dir.as_os_str().to_owned(),
                other => OsString::from(
                    other
                        .replace("{input}", &source.to_string_lossy())
                        .replace("{output}", &work_dir.to_string_lossy()),
                ),
            })
            .collect()
    }

    fn not_found(&self) -> ExtractorError {
        ExtractorError::ToolNotFound {
            command: self.config.command.clone(),
        }
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    fn name(&self) -> &str {
        "command"
    }

    async fn extract(
        &self,
        source: &Path,
        work_dir: &Path,
    ) -> Result<Extraction, ExtractorError> {
        if !source.is_file() {
            return Err(ExtractorError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        let args = self.build_args(source, work_dir);
        let start = Instant::now();

        let child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    self.not_found()
                } else {
                    ExtractorError::Io(e)
                }
            })?;

        // Dropping the child on timeout kills it.
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExtractorError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ExtractorError::failed(
                format!(
                    "{} exited with code: {:?}",
                    self.config.command,
                    output.status.code()
                ),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        debug!(
            source = %source.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extraction finished"
        );

        Ok(Extraction::at(work_dir))
    }

    fn payload_layout(&self) -> Option<PayloadLayout> {
        Some(self.config.payload_layout())
    }

    async fn validate(&self) -> Result<(), ExtractorError> {
        if resolve_command(&self.config.command).is_some() {
            Ok(())
        } else {
            Err(self.not_found())
        }
    }
}

/// Resolves a command the way the process spawner would: as a path when it
/// contains a separator, otherwise through `PATH`.
fn resolve_command(command: &str) -> Option<PathBuf> {
    let path = Path::new(command);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_default() {
        let extractor = CommandExtractor::with_defaults();
        let args = extractor.build_args(Path::new("/books/a.mobi"), Path::new("/tmp/w"));
        assert_eq!(
            args,
            vec![OsString::from("/books/a.mobi"), OsString::from("/tmp/w")]
        );
    }

    #[test]
    fn test_build_args_embedded_placeholder() {
        let config = ExtractorConfig::default().with_args(["--out={output}", "{input}"]);
        let extractor = CommandExtractor::new(config);
        let args = extractor.build_args(Path::new("a.mobi"), Path::new("/w"));
        assert_eq!(args[0], OsString::from("--out=/w"));
        assert_eq!(args[1], OsString::from("a.mobi"));
    }

    #[test]
    fn test_payload_layout_from_config() {
        let extractor = CommandExtractor::with_defaults();
        let layout = extractor.payload_layout().unwrap();
        assert_eq!(layout.primary, PathBuf::from("mobi8/OEBPS/Images"));
    }

    #[tokio::test]
    async fn test_extract_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = CommandExtractor::with_defaults();
        let err = extractor
            .extract(&dir.path().join("missing.mobi"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_extract_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mobi");
        std::fs::write(&source, b"BOOKMOBI").unwrap();
        let work = tempfile::tempdir().unwrap();

        let config = ExtractorConfig::default().with_command("/nonexistent/bin/mobiunpack");
        let extractor = CommandExtractor::new(config);
        let err = extractor.extract(&source, work.path()).await.unwrap_err();
        assert!(matches!(err, ExtractorError::ToolNotFound { .. }));
        assert!(extractor.validate().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_runs_tool() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mobi");
        std::fs::write(&source, b"BOOKMOBI").unwrap();
        let work = tempfile::tempdir().unwrap();

        let script = r#"mkdir -p "$1/mobi7/Images" && cp "$0" "$1/mobi7/Images/""#;
        let config = ExtractorConfig::default()
            .with_command("sh")
            .with_args(["-c", script, "{input}", "{output}"]);
        let extractor = CommandExtractor::new(config);
        let extraction = extractor.extract(&source, work.path()).await.unwrap();
        assert_eq!(extraction.root_dir, work.path());
        assert!(work.path().join("mobi7/Images/a.mobi").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_nonzero_exit_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mobi");
        std::fs::write(&source, b"BOOKMOBI").unwrap();

        let config = ExtractorConfig::default()
            .with_command("sh")
            .with_args(["-c", "echo 'not a mobi file' >&2; exit 3"]);
        let extractor = CommandExtractor::new(config);
        let err = extractor.extract(&source, dir.path()).await.unwrap_err();
        assert_eq!(err.stderr(), Some("not a mobi file"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mobi");
        std::fs::write(&source, b"BOOKMOBI").unwrap();

        let config = ExtractorConfig::default()
            .with_command("sleep")
            .with_args(["5"])
            .with_timeout(1);
        let extractor = CommandExtractor::new(config);
        let err = extractor.extract(&source, dir.path()).await.unwrap_err();
        assert!(matches!(err, ExtractorError::Timeout { timeout_secs: 1 }));
    }
}
