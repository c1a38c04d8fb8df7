//! Batch driver tying the pool, the task and the aggregator together.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::pool::{PoolStatus, ShutdownSignal, WorkerPool};
use super::report::{BatchReport, ResultAggregator};
use super::task::ConversionTask;
use super::types::Batch;
use crate::extractor::Extractor;
use crate::scanner::Scan;

/// Converts batches of candidates with one extractor.
pub struct Pipeline {
    pool: WorkerPool,
    task: Arc<ConversionTask>,
    shutdown: ShutdownSignal,
}

impl Pipeline {
    /// Creates a pipeline. Fails on an invalid worker count.
    pub fn new(
        config: &PipelineConfig,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            pool: WorkerPool::new(config.max_workers)?,
            task: Arc::new(ConversionTask::new(extractor, config)),
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Uses an externally owned shutdown signal.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Signal that stops dispatching when triggered.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Current pool counters.
    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Converts everything a scan yields. Skips and unreadable entries seen
    /// by the scan are included in the report.
    pub async fn run_scan(&self, scan: Scan) -> BatchReport {
        info!(
            root = %scan.root().display(),
            workers = self.pool.max_workers(),
            "Starting batch"
        );
        let start = Instant::now();
        let tally = scan.tally();
        let pool_report = self
            .pool
            .run(scan, Arc::clone(&self.task), self.shutdown.clone())
            .await;

        let mut aggregator = ResultAggregator::new();
        aggregator.record_pool(pool_report);
        aggregator.record_scan(&tally);
        let report = aggregator.finish();
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Batch finished");
        report
    }

    /// Converts an explicit batch.
    pub async fn run_batch(&self, batch: Batch) -> BatchReport {
        info!(
            candidates = batch.len(),
            workers = self.pool.max_workers(),
            "Starting batch"
        );
        let start = Instant::now();
        let pool_report = self
            .pool
            .run(batch, Arc::clone(&self.task), self.shutdown.clone())
            .await;

        let mut aggregator = ResultAggregator::new();
        aggregator.record_pool(pool_report);
        let report = aggregator.finish();
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Batch finished");
        report
    }
}
