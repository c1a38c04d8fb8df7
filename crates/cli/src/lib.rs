//! Shared command-line plumbing for the `dir-archive` and `mobi2archive`
//! binaries.

pub mod args;
pub mod logging;
pub mod run;

pub use args::{CommonArgs, DirArchiveArgs, Mobi2ArchiveArgs};
pub use logging::LoggingContext;
pub use run::{finish, run_dir_archive, run_mobi2archive, EXIT_FATAL};
