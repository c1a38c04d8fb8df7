use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{info, warn};
use walkdir::WalkDir;

use super::error::ScanError;
use crate::format::ArchiveFormat;
use crate::pipeline::Candidate;

/// Counters a scan updates while it is consumed.
///
/// Clones share the same counters, so a tally taken before handing the
/// `Scan` to the worker pool can be read after the pool finishes.
#[derive(Debug, Clone, Default)]
pub struct ScanTally {
    skipped: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl ScanTally {
    /// Sources skipped because their archive already exists.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Entries that could not be read.
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Discovers candidates for one target format.
#[derive(Debug, Clone)]
pub struct Scanner {
    format: ArchiveFormat,
    force: bool,
}

impl Scanner {
    /// Creates a scanner that skips sources whose archive exists.
    pub fn new(format: ArchiveFormat) -> Self {
        Self {
            format,
            force: false,
        }
    }

    /// Also produce candidates whose archive exists (it is overwritten).
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Recursively scans `root` for regular files with the given extension.
    ///
    /// The extension is matched exactly, with or without a leading dot:
    /// `mobi` matches `a.mobi` but not `a.MOBI`.
    pub fn scan_files(&self, root: &Path, extension: &str) -> Result<Scan, ScanError> {
        check_root(root)?;
        let extension = extension.trim_start_matches('.').to_string();
        Ok(self.walk(root, WalkDir::new(root), Mode::Files { extension }))
    }

    /// Scans the top-level directories of `root`, ignoring hidden ones.
    pub fn scan_directories(&self, root: &Path) -> Result<Scan, ScanError> {
        check_root(root)?;
        let walker = WalkDir::new(root).min_depth(1).max_depth(1);
        Ok(self.walk(root, walker, Mode::Directories))
    }

    fn walk(&self, root: &Path, walker: WalkDir, mode: Mode) -> Scan {
        Scan {
            root: root.to_path_buf(),
            entries: walker.sort_by_file_name().into_iter(),
            mode,
            format: self.format.clone(),
            force: self.force,
            tally: ScanTally::default(),
        }
    }
}

/// Recursively scans `root` for files with `extension`, producing candidates
/// targeting `format`.
pub fn scan(
    root: &Path,
    extension: &str,
    format: ArchiveFormat,
    force: bool,
) -> Result<Scan, ScanError> {
    Scanner::new(format).with_force(force).scan_files(root, extension)
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    std::fs::read_dir(root)
        .map(|_| ())
        .map_err(|error| ScanError::RootUnreadable {
            path: root.to_path_buf(),
            error,
        })
}

#[derive(Debug, Clone)]
enum Mode {
    Files { extension: String },
    Directories,
}

/// Lazy sequence of candidates, in file-name order.
pub struct Scan {
    root: PathBuf,
    entries: walkdir::IntoIter,
    mode: Mode,
    format: ArchiveFormat,
    force: bool,
    tally: ScanTally,
}

impl Scan {
    /// Handle to this scan's counters.
    pub fn tally(&self) -> ScanTally {
        self.tally.clone()
    }

    /// Directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn matches(&self, entry: &walkdir::DirEntry) -> bool {
        match &self.mode {
            Mode::Files { extension } => {
                is_file(entry) && entry.path().extension() == Some(OsStr::new(extension))
            }
            Mode::Directories => {
                is_dir(entry) && !entry.file_name().to_string_lossy().starts_with('.')
            }
        }
    }

    fn candidate_for(&self, path: &Path) -> Candidate {
        match self.mode {
            Mode::Files { .. } => Candidate::for_file(path, self.format.clone()),
            Mode::Directories => Candidate::for_directory(path, self.format.clone()),
        }
    }
}

// Symlinks count as what they point to. Linked directories are still not
// descended into.
fn is_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn is_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

impl Iterator for Scan {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string());
                    warn!(path = %path, error = %e, "Skipping unreadable entry");
                    self.tally.errors.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            if !self.matches(&entry) {
                continue;
            }

            let candidate = self.candidate_for(entry.path());
            if !self.force && candidate.target_archive_path.exists() {
                info!(
                    "Skipping '{}': '{}' already exists",
                    candidate.source_path.display(),
                    candidate.target_archive_path.display()
                );
                self.tally.skipped.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            return Some(candidate);
        }
    }
}

impl std::fmt::Debug for Scan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .field("format", &self.format.name)
            .field("force", &self.force)
            .finish()
    }
}
