//! Sync phases, outcomes and statistics.

use crate::reconcile::ReconcileSummary;
use std::time::Instant;

/// Where a table orchestrator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing scheduled.
    Idle,
    /// A local edit armed the debounce timer.
    PendingDebounce,
    /// An apply-operations call is in flight.
    Syncing,
    /// Teardown is sending the last unsynced edits.
    Flushing,
}

impl SyncPhase {
    /// Returns true while a call is being made.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncPhase::Syncing | SyncPhase::Flushing)
    }
}

/// What started a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// The debounce window expired.
    Debounce,
    /// An explicit `flush` call.
    Manual,
    /// The orchestrator is being torn down.
    Teardown,
    /// Absorbing a server push.
    ServerPush,
    /// A local edit no model could hold.
    LocalEdit,
}

/// Why a sync attempt made no call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The view is showing outdated data.
    Stale,
    /// No local edit since the last sync.
    NothingPending,
    /// Local state already matches the server snapshot.
    NoChanges,
}

/// Result of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No call was made.
    Skipped(SkipReason),
    /// A batch was accepted by the server.
    Synced {
        /// Operations sent.
        operations: usize,
        /// Temporary ids resolved to server ids.
        inserts_resolved: usize,
    },
}

/// Result of absorbing a server push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The push matched the tracked server snapshot.
    Unchanged,
    /// The push was merged into the live models.
    Applied(ReconcileSummary),
}

/// Statistics about a table orchestrator.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Calls accepted by the server.
    pub syncs_completed: u64,
    /// Attempts that failed.
    pub syncs_failed: u64,
    /// Operations sent in accepted calls.
    pub operations_sent: u64,
    /// Temporary ids resolved.
    pub inserts_resolved: u64,
    /// Server pushes merged into the models.
    pub pushes_absorbed: u64,
    /// Server pushes identical to the tracked snapshot.
    pub pushes_ignored: u64,
    /// Last successful sync.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}
