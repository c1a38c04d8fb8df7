//! Extractor module for turning sources into packable directory trees.
//!
//! `CommandExtractor` runs an external container unpacker (by default
//! `mobiunpack <input> <output>`) into a per-task working directory and
//! reports which image directories to look for. `DirectorySource` passes a
//! directory through unchanged so it is archived under its own name.

mod command;
mod config;
mod directory;
mod error;
mod traits;
mod types;

pub use command::CommandExtractor;
pub use config::ExtractorConfig;
pub use directory::DirectorySource;
pub use error::ExtractorError;
pub(crate) use error::stderr_suffix;
pub use traits::Extractor;
pub use types::{Extraction, PayloadLayout};
