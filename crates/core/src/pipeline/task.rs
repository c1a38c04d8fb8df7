//! A single conversion: extract, select payload, pack, clean up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::config::PipelineConfig;
use super::error::TaskError;
use super::payload::select_payload_root;
use super::types::{Candidate, TaskOutcome, TaskState};
use crate::extractor::Extractor;
use crate::format::{FormatError, PackRequest, PackResult};

/// Converts one candidate into its archive.
///
/// `execute` never returns an error: every failure ends up in the outcome.
pub struct ConversionTask {
    extractor: Arc<dyn Extractor>,
    temp_dir: PathBuf,
}

impl ConversionTask {
    /// Creates a task runner using `extractor` and the configured temp dir.
    pub fn new(extractor: Arc<dyn Extractor>, config: &PipelineConfig) -> Self {
        Self {
            extractor,
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Returns the extractor.
    pub fn extractor(&self) -> &Arc<dyn Extractor> {
        &self.extractor
    }

    /// Runs the conversion and reports how it went.
    pub async fn execute(&self, candidate: Candidate) -> TaskOutcome {
        let start = Instant::now();
        let source = candidate.source_path.display().to_string();
        info!("Processing '{}' to {} archive", source, candidate.format.name);
        advance(&source, TaskState::Pending, TaskState::Running);

        let work_dir = match self.create_work_dir().await {
            Ok(dir) => dir,
            Err(e) => {
                advance(&source, TaskState::Running, TaskState::Failed);
                return TaskOutcome::failed(candidate, e, start.elapsed());
            }
        };

        let result = self.convert(&candidate, work_dir.path()).await;

        // Drop of the guard also removes the directory if a step panics.
        let work_path = work_dir.path().to_path_buf();
        let cleanup_warning = match work_dir.close() {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    path = %work_path.display(),
                    error = %e,
                    "Failed to remove working directory"
                );
                Some(format!(
                    "Failed to remove working directory {}: {}",
                    work_path.display(),
                    e
                ))
            }
        };

        let outcome = match result {
            Ok(packed) => {
                info!(
                    "Archived '{}' into '{}'",
                    source,
                    candidate.target_archive_path.display()
                );
                advance(&source, TaskState::Running, TaskState::Succeeded);
                TaskOutcome::succeeded(candidate, packed.size_bytes, start.elapsed())
            }
            Err(e) => {
                advance(&source, TaskState::Running, TaskState::Failed);
                TaskOutcome::failed(candidate, e, start.elapsed())
            }
        };

        outcome.with_cleanup_warning(cleanup_warning)
    }

    async fn create_work_dir(&self) -> Result<TempDir, TaskError> {
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(TaskError::WorkDir)?;
        tempfile::Builder::new()
            .prefix("task-")
            .tempdir_in(&self.temp_dir)
            .map_err(TaskError::WorkDir)
    }

    async fn convert(
        &self,
        candidate: &Candidate,
        work_dir: &Path,
    ) -> Result<PackResult, TaskError> {
        let extract_start = Instant::now();
        let extraction = self
            .extractor
            .extract(&candidate.source_path, work_dir)
            .await?;
        debug!(
            source = %candidate.source_path.display(),
            elapsed_ms = extract_start.elapsed().as_millis() as u64,
            "Extract step done"
        );

        let staging = staging_path(&candidate.target_archive_path);
        let request = match self.extractor.payload_layout() {
            Some(layout) => {
                let payload = select_payload_root(&extraction.root_dir, &layout)?;
                PackRequest::contents_of(payload, &staging)
            }
            None => PackRequest {
                root_dir: extraction.root_dir,
                base_dir: extraction.base_dir,
                output: staging.clone(),
            },
        };

        let pack_start = Instant::now();
        let packed = pack_atomically(candidate, request, &staging).await?;
        debug!(
            target = %candidate.target_archive_path.display(),
            size_bytes = packed.size_bytes,
            entries = packed.entries,
            elapsed_ms = pack_start.elapsed().as_millis() as u64,
            "Pack step done"
        );

        Ok(packed)
    }
}

/// Packs into `staging`, then renames it onto the target. The staging file
/// never survives a failure.
async fn pack_atomically(
    candidate: &Candidate,
    request: PackRequest,
    staging: &Path,
) -> Result<PackResult, TaskError> {
    // Left over from an interrupted earlier run.
    remove_if_present(staging).await;

    let packed = match candidate.format.packer.pack(request).await {
        Ok(packed) => packed,
        Err(e) => {
            remove_if_present(staging).await;
            return Err(e.into());
        }
    };

    if let Err(e) = tokio::fs::rename(staging, &candidate.target_archive_path).await {
        remove_if_present(staging).await;
        return Err(TaskError::Pack(FormatError::Io(e)));
    }

    Ok(PackResult {
        output: candidate.target_archive_path.clone(),
        ..packed
    })
}

async fn remove_if_present(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove staging file");
        }
    }
}

/// `.<name>.partial` next to the target.
pub(crate) fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.partial", name))
}

fn advance(source: &str, from: TaskState, to: TaskState) {
    debug_assert!(from.can_transition_to(to));
    debug!(source, "Task {} -> {}", from, to);
}
