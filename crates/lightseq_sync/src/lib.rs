//! # LightSeq Sync
//!
//! Client-side reconciliation between live editable models and the server's
//! document store.
//!
//! This crate provides:
//! - Live models in an arena with stable handles ([`ModelStore`])
//! - Reconciliation of server pushes into live models
//! - A debounced, per-table sync orchestrator ([`TableSync`])
//! - Temporary-id resolution after inserts
//! - Unload guarding across tables ([`SyncRegistry`])
//! - Transport abstraction for the apply-operations RPC
//!
//! ## Architecture
//!
//! Each table runs one orchestrator:
//! 1. Server pushes are reconciled into the models and tracked as the
//!    server snapshot
//! 2. Local edits are snapshotted and debounced
//! 3. The snapshot is diffed against the server snapshot and sent as one batch
//! 4. Accepted inserts have their temporary ids rewritten in place
//!
//! ## Key Invariants
//!
//! - The server snapshot only advances on server pushes and accepted batches
//! - At most one apply-operations call per table is in flight
//! - Echoes of a server push are never sent back
//! - Failures are reported, never propagated into the observers

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod debounce;
mod error;
mod model;
mod node;
mod orchestrator;
mod reconcile;
mod registry;
mod reporter;
mod state;
mod transport;

pub use config::{SyncConfig, DEFAULT_DEBOUNCE};
pub use debounce::Debouncer;
pub use error::{SyncError, SyncResult};
pub use model::{DocumentModel, Model, ModelHandle, ModelStore};
pub use node::{Effect, NodeHandler, NodeModel};
pub use orchestrator::TableSync;
pub use reconcile::{reconcile, ReconcileSummary};
pub use registry::{SyncRegistry, UnloadDecision, UnloadGuard};
pub use reporter::{ErrorContext, ErrorReporter, MemoryReporter, Report, TracingReporter};
pub use state::{PushOutcome, SkipReason, SyncOutcome, SyncPhase, SyncStats, SyncTrigger};
pub use transport::{MockTransport, OperationsTransport};
