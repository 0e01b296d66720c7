//! Error reporting for failures caught at the orchestrator boundary.

use crate::error::SyncError;
use crate::state::SyncTrigger;
use lightseq_protocol::TableName;
use parking_lot::Mutex;
use tracing::error;

/// Where and during what a failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Table being synced.
    pub table: TableName,
    /// Number of operations in the attempted batch (0 for server pushes).
    pub operation_count: usize,
    /// What started the failing work.
    pub trigger: SyncTrigger,
}

/// Receives sync and reconciliation failures.
///
/// Failures never propagate across the observation boundary; the orchestrator
/// hands them here and keeps going.
pub trait ErrorReporter: Send + Sync {
    /// Reports one failure.
    fn report(&self, context: &ErrorContext, error: &SyncError);
}

/// Logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, context: &ErrorContext, err: &SyncError) {
        error!(
            table = %context.table,
            operations = context.operation_count,
            trigger = ?context.trigger,
            error = %err,
            "sync failed"
        );
    }
}

/// A reported failure, as captured by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Failure context.
    pub context: ErrorContext,
    /// Rendered error message.
    pub message: String,
    /// Whether the error was classed as transient.
    pub retryable: bool,
}

/// Collects reports in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    /// Number of reports so far.
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ErrorReporter for MemoryReporter {
    fn report(&self, context: &ErrorContext, err: &SyncError) {
        self.reports.lock().push(Report {
            context: context.clone(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reporter_collects() {
        let reporter = MemoryReporter::new();
        assert!(reporter.is_empty());

        let context = ErrorContext {
            table: TableName::Playlists,
            operation_count: 3,
            trigger: SyncTrigger::Debounce,
        };
        reporter.report(&context, &SyncError::transport_retryable("timeout"));

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context, context);
        assert!(reports[0].retryable);
        assert!(reports[0].message.contains("timeout"));
    }
}
