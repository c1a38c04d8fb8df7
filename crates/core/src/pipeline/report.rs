//! Batch result aggregation.

use tracing::{info, warn};

use super::pool::PoolReport;
use super::types::{TaskOutcome, TaskStatus};
use crate::scanner::ScanTally;

/// Exit status when every dispatched candidate succeeded or was skipped.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status when at least one candidate failed.
pub const EXIT_FAILURES: u8 = 1;

/// Collects outcomes and scan counters for one batch.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    outcomes: Vec<TaskOutcome>,
    skipped: usize,
    scan_errors: usize,
    undispatched: usize,
    interrupted: bool,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one outcome.
    pub fn record(&mut self, outcome: TaskOutcome) {
        self.outcomes.push(outcome);
    }

    /// Records everything a pool run produced.
    pub fn record_pool(&mut self, report: PoolReport) {
        self.outcomes.extend(report.outcomes);
        self.undispatched += report.undispatched;
        self.interrupted |= report.interrupted;
    }

    /// Records the scan's skip and error counts.
    pub fn record_scan(&mut self, tally: &ScanTally) {
        self.skipped += tally.skipped();
        self.scan_errors += tally.errors();
    }

    /// Adds candidates skipped outside a scan.
    pub fn add_skipped(&mut self, count: usize) {
        self.skipped += count;
    }

    /// Logs failures and counts, and returns the report.
    pub fn finish(mut self) -> BatchReport {
        self.outcomes
            .sort_by(|a, b| a.candidate.source_path.cmp(&b.candidate.source_path));

        let report = BatchReport {
            outcomes: self.outcomes,
            skipped: self.skipped,
            scan_errors: self.scan_errors,
            undispatched: self.undispatched,
            interrupted: self.interrupted,
        };
        report.log();
        report
    }
}

/// Final, sorted view of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Outcomes sorted by source path.
    pub outcomes: Vec<TaskOutcome>,
    pub skipped: usize,
    pub scan_errors: usize,
    pub undispatched: usize,
    pub interrupted: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    /// Failed outcomes, in source order.
    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Process exit status: non-zero iff at least one task failed.
    pub fn exit_code(&self) -> u8 {
        if self.failed() > 0 {
            EXIT_FAILURES
        } else {
            EXIT_SUCCESS
        }
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    fn log(&self) {
        for outcome in self.failures() {
            warn!(
                "Failed to convert '{}': {}",
                outcome.candidate.source_path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }

        if self.scan_errors > 0 {
            warn!(count = self.scan_errors, "Some entries could not be read");
        }
        if self.interrupted {
            warn!(
                undispatched = self.undispatched,
                "Interrupted; remaining candidates were not processed"
            );
        }

        info!(
            succeeded = self.succeeded(),
            skipped = self.skipped,
            failed = self.failed(),
            "Batch complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{CodecConfig, FormatRegistry};
    use crate::pipeline::Candidate;
    use std::path::Path;
    use std::time::Duration;

    fn candidate(path: &str) -> Candidate {
        let zip = FormatRegistry::with_builtin(&CodecConfig::default())
            .lookup("zip")
            .unwrap();
        Candidate::for_file(Path::new(path), zip)
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let report = ResultAggregator::new().finish();
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_any_failure_sets_exit_code() {
        let mut agg = ResultAggregator::new();
        agg.record(TaskOutcome::succeeded(candidate("b.mobi"), 10, Duration::ZERO));
        agg.record(TaskOutcome::failed(candidate("c.mobi"), "bad", Duration::ZERO));
        agg.record(TaskOutcome::succeeded(candidate("a.mobi"), 10, Duration::ZERO));
        agg.add_skipped(2);
        let report = agg.finish();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.exit_code(), EXIT_FAILURES);
        let order: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| o.candidate.source_path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(order, vec!["a.mobi", "b.mobi", "c.mobi"]);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_cleanup_warning_does_not_fail_batch() {
        let mut agg = ResultAggregator::new();
        agg.record(
            TaskOutcome::succeeded(candidate("a.mobi"), 1, Duration::ZERO)
                .with_cleanup_warning(Some("busy".to_string())),
        );
        assert_eq!(agg.finish().exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_record_pool_report() {
        let mut agg = ResultAggregator::new();
        agg.record_pool(PoolReport {
            outcomes: vec![TaskOutcome::succeeded(candidate("a.mobi"), 1, Duration::ZERO)],
            undispatched: 3,
            interrupted: true,
        });
        let report = agg.finish();
        assert!(report.interrupted);
        assert_eq!(report.undispatched, 3);
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
    }
}
