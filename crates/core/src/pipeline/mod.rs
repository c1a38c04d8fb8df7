//! Batch conversion pipeline.
//!
//! Candidates flow from a scan (or an explicit `Batch`) through a bounded
//! queue into a fixed set of workers. Each worker runs a `ConversionTask`:
//! extract into a private working directory, choose the payload directory,
//! pack into a staging file, rename it onto the target, and remove the
//! working directory. Outcomes are collected into a `BatchReport` whose
//! exit code is non-zero iff some task failed.
//!
//! # Example
//!
//! ```ignore
//! use archivist_core::pipeline::{Pipeline, PipelineConfig};
//! use archivist_core::extractor::{CommandExtractor, ExtractorConfig};
//!
//! let extractor = Arc::new(CommandExtractor::new(ExtractorConfig::default()));
//! let pipeline = Pipeline::new(&PipelineConfig::default(), extractor)?;
//! let report = pipeline.run_scan(scan).await;
//! std::process::exit(report.exit_code() as i32);
//! ```

mod config;
mod error;
mod payload;
mod pool;
mod report;
mod runner;
mod task;
mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, TaskError};
pub use payload::select_payload_root;
pub use pool::{PoolReport, PoolStatus, ShutdownSignal, WorkerPool};
pub use report::{BatchReport, ResultAggregator, EXIT_FAILURES, EXIT_SUCCESS};
pub use runner::Pipeline;
pub use task::ConversionTask;
pub use types::{Batch, Candidate, TaskOutcome, TaskState, TaskStatus};
