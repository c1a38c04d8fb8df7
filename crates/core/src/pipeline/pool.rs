//! Fixed-size worker pool fed by a bounded queue.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use super::error::{PipelineError, TaskError};
use super::task::ConversionTask;
use super::types::{Candidate, TaskOutcome};

/// Cooperative stop request shared between the caller, the feeder and the
/// workers. Once triggered, nothing new is dispatched; running tasks finish.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Snapshot of pool counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub max_workers: usize,
    pub active: usize,
    pub queued: usize,
    pub total_processed: u64,
    pub total_failed: u64,
}

/// Tracks statistics for the pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, max_workers: usize) -> PoolStatus {
        PoolStatus {
            max_workers,
            active: self.active.load(Ordering::Relaxed) as usize,
            queued: self.queued.load(Ordering::Relaxed) as usize,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Everything a pool run produced.
#[derive(Debug, Default)]
pub struct PoolReport {
    /// One outcome per dispatched candidate, in completion order.
    pub outcomes: Vec<TaskOutcome>,
    /// Candidates pulled from the source but never started because of
    /// shutdown. The unread rest of the source is not counted.
    pub undispatched: usize,
    /// Whether shutdown was requested during the run.
    pub interrupted: bool,
}

/// Runs conversion tasks with at most `max_workers` in flight.
pub struct WorkerPool {
    max_workers: usize,
    stats: Arc<PoolStats>,
}

impl WorkerPool {
    /// Creates a pool. Zero workers is rejected.
    pub fn new(max_workers: usize) -> Result<Self, PipelineError> {
        if max_workers == 0 {
            return Err(PipelineError::InvalidWorkers(max_workers));
        }
        Ok(Self {
            max_workers,
            stats: Arc::new(PoolStats::default()),
        })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Returns the current counters.
    pub fn status(&self) -> PoolStatus {
        self.stats.to_status(self.max_workers)
    }

    /// Dispatches every candidate exactly once and waits for all of them.
    ///
    /// `candidates` is consumed on a blocking thread, so a lazy filesystem
    /// scan keeps producing while workers convert. After shutdown no further
    /// candidate is pulled. A panicking task becomes
    /// a failed outcome; the other tasks are unaffected.
    pub async fn run<I>(
        &self,
        candidates: I,
        task: Arc<ConversionTask>,
        shutdown: ShutdownSignal,
    ) -> PoolReport
    where
        I: IntoIterator<Item = Candidate>,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Candidate>(self.max_workers);
        let rx = Arc::new(Mutex::new(rx));
        let undispatched = Arc::new(AtomicUsize::new(0));

        let feeder = {
            let candidates = candidates.into_iter();
            let stats = Arc::clone(&self.stats);
            let shutdown = shutdown.clone();
            let undispatched = Arc::clone(&undispatched);
            tokio::task::spawn_blocking(move || {
                feed(candidates, tx, &stats, &shutdown, &undispatched)
            })
        };

        let workers: Vec<_> = (0..self.max_workers)
            .map(|id| {
                let rx = Arc::clone(&rx);
                let task = Arc::clone(&task);
                let stats = Arc::clone(&self.stats);
                let shutdown = shutdown.clone();
                let undispatched = Arc::clone(&undispatched);
                tokio::spawn(async move {
                    worker_loop(id, rx, task, stats, shutdown, undispatched).await
                })
            })
            .collect();

        let mut outcomes = Vec::new();
        for result in join_all(workers).await {
            match result {
                Ok(mut worker_outcomes) => outcomes.append(&mut worker_outcomes),
                Err(e) => error!(error = %e, "Worker loop aborted"),
            }
        }

        if let Err(e) = feeder.await {
            error!(error = %e, "Candidate feeder aborted");
        }

        PoolReport {
            outcomes,
            undispatched: undispatched.load(Ordering::SeqCst),
            interrupted: shutdown.is_triggered(),
        }
    }
}

fn feed<I>(
    candidates: I,
    tx: mpsc::Sender<Candidate>,
    stats: &PoolStats,
    shutdown: &ShutdownSignal,
    undispatched: &AtomicUsize,
) where
    I: Iterator<Item = Candidate>,
{
    let mut candidates = candidates;
    // Checked before each pull so a stop request leaves the rest of a lazy
    // scan unread.
    while !shutdown.is_triggered() {
        let Some(candidate) = candidates.next() else {
            break;
        };
        stats.queued.fetch_add(1, Ordering::Relaxed);
        if tx.blocking_send(candidate).is_err() {
            // All workers are gone; nothing more can run.
            stats.queued.fetch_sub(1, Ordering::Relaxed);
            undispatched.fetch_add(1, Ordering::SeqCst);
            break;
        }
    }
}

async fn worker_loop(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Candidate>>>,
    task: Arc<ConversionTask>,
    stats: Arc<PoolStats>,
    shutdown: ShutdownSignal,
    undispatched: Arc<AtomicUsize>,
) -> Vec<TaskOutcome> {
    let mut outcomes = Vec::new();

    loop {
        let next = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(candidate) = next else {
            break;
        };
        stats.queued.fetch_sub(1, Ordering::Relaxed);

        if shutdown.is_triggered() {
            undispatched.fetch_add(1, Ordering::SeqCst);
            continue;
        }

        debug!(worker = id, source = %candidate.source_path.display(), "Dispatching task");
        stats.active.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let handle = {
            let task = Arc::clone(&task);
            let candidate = candidate.clone();
            tokio::spawn(async move { task.execute(candidate).await })
        };
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = panic_message(e);
                warn!(
                    source = %candidate.source_path.display(),
                    reason = %reason,
                    "Task panicked"
                );
                TaskOutcome::failed(candidate, TaskError::Panicked(reason), start.elapsed())
            }
        };

        stats.active.fetch_sub(1, Ordering::Relaxed);
        stats.total_processed.fetch_add(1, Ordering::Relaxed);
        if !outcome.is_success() {
            stats.total_failed.fetch_add(1, Ordering::Relaxed);
        }
        outcomes.push(outcome);
    }

    debug!(worker = id, completed = outcomes.len(), "Worker finished");
    outcomes
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(PipelineError::InvalidWorkers(0))
        ));
    }

    #[test]
    fn test_initial_status() {
        let pool = WorkerPool::new(3).unwrap();
        let status = pool.status();
        assert_eq!(status.max_workers, 3);
        assert_eq!(status.active, 0);
        assert_eq!(status.total_processed, 0);
    }

    #[test]
    fn test_shutdown_signal_shared() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_triggered());
        signal.trigger();
        assert!(clone.is_triggered());
    }

    #[tokio::test]
    async fn test_panic_message() {
        let err = tokio::spawn(async { panic!("corrupt header") })
            .await
            .unwrap_err();
        assert_eq!(panic_message(err), "corrupt header");
    }

    #[tokio::test]
    async fn test_shutdown_stops_pulling_candidates() {
        use crate::pipeline::PipelineConfig;
        use crate::testing::{fixtures, MockExtractor};
        use std::path::Path;

        let format = fixtures::builtin_format("zip");
        let pulled = Arc::new(AtomicUsize::new(0));
        let candidates = {
            let pulled = Arc::clone(&pulled);
            (0..1000).map(move |i| {
                pulled.fetch_add(1, Ordering::SeqCst);
                Candidate::for_file(Path::new(&format!("/library/{}.mobi", i)), format.clone())
            })
        };
        let task = Arc::new(ConversionTask::new(
            Arc::new(MockExtractor::new()),
            &PipelineConfig::default(),
        ));
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let pool = WorkerPool::new(2).unwrap();
        let report = pool.run(candidates, task, shutdown).await;

        assert!(report.interrupted);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.undispatched, 0);
        assert_eq!(pulled.load(Ordering::SeqCst), 0);
    }
}
