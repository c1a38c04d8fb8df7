//! Candidate discovery.
//!
//! A scan walks a directory tree lazily and yields one `Candidate` per
//! source that still needs an archive. Sources whose archive already exists
//! are skipped unless forced; unreadable entries are logged and counted
//! without stopping the walk.

mod error;
mod scan;

pub use error::ScanError;
pub use scan::{scan, Scan, ScanTally, Scanner};
