//! Command-line arguments.

use clap::{Args, Parser};
use std::path::PathBuf;

/// Flags shared by both tools.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Configuration file (TOML). Also read from ARCHIVIST_CONFIG.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More output (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CommonArgs {
    /// Config file from the flag, else from `ARCHIVIST_CONFIG`.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var_os("ARCHIVIST_CONFIG").map(PathBuf::from))
    }
}

/// Archive every top-level directory of a folder.
#[derive(Debug, Clone, Parser)]
#[command(name = "dir-archive", version)]
pub struct DirArchiveArgs {
    /// Archive format (zip, tar, gztar, bztar, xztar, 7zip when available).
    #[arg(value_name = "FORMAT")]
    pub format: String,

    /// Directory whose subdirectories are archived.
    #[arg(short = 'd', long = "directory", value_name = "DIR", default_value = ".")]
    pub directory: PathBuf,

    /// Number of archives written at once [default: 4].
    #[arg(short = 'w', long = "max-workers", value_name = "N")]
    pub max_workers: Option<usize>,

    /// Overwrite archives that already exist.
    #[arg(short = 'F', long = "force")]
    pub force: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Convert .mobi books into image archives.
#[derive(Debug, Clone, Parser)]
#[command(name = "mobi2archive", version)]
pub struct Mobi2ArchiveArgs {
    /// Directory searched recursively for .mobi files.
    #[arg(short = 'd', long = "directory", value_name = "DIR", default_value = ".")]
    pub directory: PathBuf,

    /// Archive format [default: 7zip if available, else zip].
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Overwrite archives that already exist.
    #[arg(short = 'F', long = "force")]
    pub force: bool,

    /// Number of books converted at once [default: 4].
    #[arg(short = 'w', long = "max-workers", value_name = "N")]
    pub max_workers: Option<usize>,

    #[command(flatten)]
    pub common: CommonArgs,
}
