//! Configuration for table sync.

use std::time::Duration;

/// Default quiescence window before local edits are sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Configuration for a [`TableSync`](crate::TableSync).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period after the last local edit before a sync runs.
    pub debounce: Duration,
    /// Whether dropping the orchestrator flushes unsynced edits.
    pub flush_on_drop: bool,
    /// Largest batch sent in one call. Larger batches are refused before any
    /// request is made.
    pub max_operations_per_call: Option<usize>,
}

impl SyncConfig {
    /// Creates a configuration with the given debounce window.
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            flush_on_drop: true,
            max_operations_per_call: None,
        }
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Enables or disables the flush performed on drop.
    pub fn with_flush_on_drop(mut self, flush: bool) -> Self {
        self.flush_on_drop = flush;
        self
    }

    /// Caps the number of operations sent per call.
    pub fn with_max_operations_per_call(mut self, max: usize) -> Self {
        self.max_operations_per_call = Some(max);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
