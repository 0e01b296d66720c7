//! Unload guarding across tables.

use crate::error::SyncResult;
use crate::state::SyncOutcome;
use lightseq_protocol::TableName;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

/// Whether the application may exit without losing edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnloadDecision {
    /// Everything is synced.
    Allow,
    /// These tables hold unsynced edits; ask the user first.
    Confirm {
        /// Tables with unsynced edits.
        tables: Vec<TableName>,
    },
}

impl UnloadDecision {
    /// Returns true if leaving needs confirmation.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, UnloadDecision::Confirm { .. })
    }
}

/// A table that can hold unsynced edits.
pub trait UnloadGuard: Send + Sync {
    /// The guarded table.
    fn table(&self) -> TableName;

    /// Returns true if local edits have not reached the server.
    fn has_unsynced_changes(&self) -> bool;

    /// Stops observing edits and flushes in the background.
    fn shutdown(&self) -> Option<JoinHandle<SyncResult<SyncOutcome>>>;
}

/// Tracks every live table so one check covers the whole application.
///
/// Holds weak references; dropping a table unregisters it.
#[derive(Default)]
pub struct SyncRegistry {
    guards: RwLock<Vec<Weak<dyn UnloadGuard>>>,
}

impl SyncRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table.
    pub fn register<G: UnloadGuard + 'static>(&self, guard: &Arc<G>) {
        let weak: Weak<G> = Arc::downgrade(guard);
        self.guards.write().push(weak);
    }

    /// Number of live registered tables.
    pub fn len(&self) -> usize {
        self.live().len()
    }

    /// Returns true if no registered table is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collects the tables that would lose edits on exit.
    pub fn before_unload(&self) -> UnloadDecision {
        let tables: Vec<TableName> = self
            .live()
            .iter()
            .filter(|guard| guard.has_unsynced_changes())
            .map(|guard| guard.table())
            .collect();
        if tables.is_empty() {
            UnloadDecision::Allow
        } else {
            UnloadDecision::Confirm { tables }
        }
    }

    /// Shuts every table down and returns the flushes that were started.
    pub fn shutdown_all(&self) -> Vec<JoinHandle<SyncResult<SyncOutcome>>> {
        self.live()
            .iter()
            .filter_map(|guard| guard.shutdown())
            .collect()
    }

    fn live(&self) -> Vec<Arc<dyn UnloadGuard>> {
        let mut guards = self.guards.write();
        guards.retain(|guard| guard.strong_count() > 0);
        guards.iter().filter_map(Weak::upgrade).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeTable {
        table: TableName,
        dirty: AtomicBool,
    }

    impl FakeTable {
        fn new(table: TableName, dirty: bool) -> Arc<Self> {
            Arc::new(Self {
                table,
                dirty: AtomicBool::new(dirty),
            })
        }
    }

    impl UnloadGuard for FakeTable {
        fn table(&self) -> TableName {
            self.table
        }

        fn has_unsynced_changes(&self) -> bool {
            self.dirty.load(Ordering::SeqCst)
        }

        fn shutdown(&self) -> Option<JoinHandle<SyncResult<SyncOutcome>>> {
            self.dirty.store(false, Ordering::SeqCst);
            None
        }
    }

    #[test]
    fn lists_dirty_tables() {
        let registry = SyncRegistry::new();
        let nodes = FakeTable::new(TableName::Nodes, true);
        let playlists = FakeTable::new(TableName::Playlists, false);
        registry.register(&nodes);
        registry.register(&playlists);

        assert_eq!(
            registry.before_unload(),
            UnloadDecision::Confirm {
                tables: vec![TableName::Nodes]
            }
        );

        assert!(registry.shutdown_all().is_empty());
        assert_eq!(registry.before_unload(), UnloadDecision::Allow);
        assert!(!registry.before_unload().needs_confirmation());
    }

    #[test]
    fn dropped_tables_unregister() {
        let registry = SyncRegistry::new();
        let nodes = FakeTable::new(TableName::Nodes, true);
        registry.register(&nodes);
        assert_eq!(registry.len(), 1);

        drop(nodes);
        assert!(registry.is_empty());
        assert_eq!(registry.before_unload(), UnloadDecision::Allow);
    }
}
