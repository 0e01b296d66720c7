//! Per-table sync orchestrator.
//!
//! A [`TableSync`] owns the live models of one table and keeps them in step
//! with the server:
//!
//! 1. Server pushes are reconciled into the models and become the tracked
//!    server snapshot.
//! 2. Every committed local edit records a snapshot of the models and re-arms
//!    a debounce timer.
//! 3. When the timer fires, the snapshot is diffed against the tracked server
//!    snapshot and the operations are sent in one call.
//! 4. On success the server snapshot advances to what was sent, and temporary
//!    ids are rewritten to the ids the server assigned.
//!
//! Calls never overlap: a sync started while another is in flight waits for
//! it and then diffs against the advanced baseline.

use crate::config::SyncConfig;
use crate::debounce::Debouncer;
use crate::error::{SyncError, SyncResult};
use crate::model::{Model, ModelHandle, ModelStore};
use crate::reconcile::reconcile;
use crate::registry::{UnloadDecision, UnloadGuard};
use crate::reporter::{ErrorContext, ErrorReporter, TracingReporter};
use crate::state::{PushOutcome, SkipReason, SyncOutcome, SyncPhase, SyncStats, SyncTrigger};
use crate::transport::OperationsTransport;
use futures::FutureExt;
use lightseq_protocol::{
    diff, ApplyOperationsRequest, ApplyOperationsResponse, Document, DocumentId, Fields,
    Operation, TableName,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct TableState<F> {
    server_snapshot: Vec<Document<F>>,
    /// Last observed model snapshot not yet confirmed by the server.
    pending: Option<Vec<Document<F>>>,
    stale: bool,
    phase: SyncPhase,
    closed: bool,
}

impl<F: Fields> TableState<F> {
    fn has_unsynced_changes(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !diff(&self.server_snapshot, pending).is_empty())
    }
}

enum Prepared<F> {
    Skip(SkipReason),
    Send {
        request: ApplyOperationsRequest,
        synced: Vec<Document<F>>,
    },
}

// Lock order: `state`, then `models`. No parking_lot guard is held across an
// await; `sync_gate` serialises whole sync attempts.
struct Shared<M: Model, T> {
    table: TableName,
    config: SyncConfig,
    transport: Arc<T>,
    reporter: Arc<dyn ErrorReporter>,
    models: RwLock<ModelStore<M>>,
    state: Mutex<TableState<M::Payload>>,
    debouncer: Debouncer,
    sync_gate: Arc<tokio::sync::Mutex<()>>,
    stats: RwLock<SyncStats>,
}

impl<M: Model, T: OperationsTransport> Shared<M, T> {
    fn settled_phase(&self) -> SyncPhase {
        if self.debouncer.is_pending() {
            SyncPhase::PendingDebounce
        } else {
            SyncPhase::Idle
        }
    }

    fn arm(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.debouncer.schedule(async move {
            // Failures are already reported.
            let _ = shared.sync(SyncTrigger::Debounce).await;
        });
    }

    fn observe(self: &Arc<Self>, state: &mut TableState<M::Payload>, snapshot: Vec<Document<M::Payload>>) {
        state.pending = Some(snapshot);
        if state.closed {
            return;
        }
        if !state.phase.is_active() {
            state.phase = SyncPhase::PendingDebounce;
        }
        self.arm();
    }

    fn edit<R>(self: &Arc<Self>, f: impl FnOnce(&mut ModelStore<M>) -> R) -> R {
        let mut state = self.state.lock();
        let (result, snapshot) = {
            let mut models = self.models.write();
            let revision = models.revision();
            let result = f(&mut models);
            let snapshot = (models.revision() != revision).then(|| models.snapshot());
            (result, snapshot)
        };
        if let Some(snapshot) = snapshot {
            debug!(table = %self.table, documents = snapshot.len(), "local edit observed");
            self.observe(&mut state, snapshot);
        }
        result
    }

    fn absorb(self: &Arc<Self>, documents: Vec<Document<M::Payload>>) -> SyncResult<PushOutcome> {
        let mut state = self.state.lock();
        if diff(&state.server_snapshot, &documents).is_empty() {
            self.stats.write().pushes_ignored += 1;
            return Ok(PushOutcome::Unchanged);
        }

        let reconciled = {
            let mut models = self.models.write();
            reconcile(&mut models, &documents, M::from_document, |model, doc| {
                model.can_absorb(doc)
            })
            .map(|summary| (summary, models.snapshot()))
        };
        let (summary, snapshot) = match reconciled {
            Ok(reconciled) => reconciled,
            Err(err) => {
                drop(state);
                self.fail(SyncTrigger::ServerPush, 0, &err);
                return Err(err);
            }
        };

        // The baseline moves before the models are observed so the resulting
        // snapshot diffs to nothing and is not echoed back.
        state.server_snapshot = documents;
        self.stats.write().pushes_absorbed += 1;
        debug!(table = %self.table, ?summary, "server push absorbed");
        if summary.is_changed() {
            self.observe(&mut state, snapshot);
        }
        Ok(PushOutcome::Applied(summary))
    }

    fn set_stale(self: &Arc<Self>, stale: bool) {
        let mut state = self.state.lock();
        let was_stale = std::mem::replace(&mut state.stale, stale);
        if was_stale && !stale && !state.closed && state.has_unsynced_changes() {
            if !state.phase.is_active() {
                state.phase = SyncPhase::PendingDebounce;
            }
            self.arm();
        }
    }

    async fn sync(&self, trigger: SyncTrigger) -> SyncResult<SyncOutcome> {
        let _gate = self.sync_gate.lock().await;
        self.run(trigger).await
    }

    /// One sync attempt. The caller holds `sync_gate`.
    async fn run(&self, trigger: SyncTrigger) -> SyncResult<SyncOutcome> {
        let mut attempted = 0;
        let (request, synced) = match self.prepare(trigger, &mut attempted) {
            Ok(Prepared::Send { request, synced }) => (request, synced),
            Ok(Prepared::Skip(reason)) => {
                debug!(table = %self.table, ?reason, ?trigger, "sync skipped");
                return Ok(SyncOutcome::Skipped(reason));
            }
            Err(err) => {
                self.fail(trigger, attempted, &err);
                return Err(err);
            }
        };

        debug!(table = %self.table, operations = attempted, ?trigger, "sending operations");
        let result = match self.transport.apply_operations(request.clone()).await {
            Ok(response) => self.complete(&request, synced, response),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.fail(trigger, attempted, err);
        }
        result
    }

    fn prepare(
        &self,
        trigger: SyncTrigger,
        attempted: &mut usize,
    ) -> SyncResult<Prepared<M::Payload>> {
        let mut state = self.state.lock();
        if state.stale {
            state.phase = self.settled_phase();
            return Ok(Prepared::Skip(SkipReason::Stale));
        }
        let Some(pending) = state.pending.as_ref() else {
            state.phase = self.settled_phase();
            return Ok(Prepared::Skip(SkipReason::NothingPending));
        };

        let operations = diff(&state.server_snapshot, pending);
        if operations.is_empty() {
            state.pending = None;
            state.phase = self.settled_phase();
            return Ok(Prepared::Skip(SkipReason::NoChanges));
        }
        *attempted = operations.len();

        if let Some(max) = self.config.max_operations_per_call {
            if operations.len() > max {
                return Err(SyncError::ContractViolation(format!(
                    "{} operations exceed the per-call limit of {max}",
                    operations.len()
                )));
            }
        }
        let wire = operations
            .iter()
            .map(Operation::to_wire)
            .collect::<Result<Vec<_>, _>>()?;
        let request = ApplyOperationsRequest::new(self.table, wire);
        request.validate()?;

        let synced = pending.clone();
        state.phase = match trigger {
            SyncTrigger::Teardown => SyncPhase::Flushing,
            _ => SyncPhase::Syncing,
        };
        Ok(Prepared::Send { request, synced })
    }

    fn complete(
        &self,
        request: &ApplyOperationsRequest,
        synced: Vec<Document<M::Payload>>,
        response: ApplyOperationsResponse,
    ) -> SyncResult<SyncOutcome> {
        let ids = response.id_map(request)?;

        let mut state = self.state.lock();
        if !ids.is_empty() {
            let mut models = self.models.write();
            for (temp_id, id) in &ids {
                if models.rewrite_id(temp_id, id.clone()).is_none() {
                    debug!(table = %self.table, %temp_id, "insert resolved for a removed model");
                }
            }
        }

        state.server_snapshot = remap(synced, &ids);
        let pending = state
            .pending
            .take()
            .map(|docs| remap(docs, &ids))
            .filter(|docs| !diff(&state.server_snapshot, docs).is_empty());
        state.pending = pending;
        if state.phase.is_active() {
            state.phase = self.settled_phase();
        }
        drop(state);

        {
            let mut stats = self.stats.write();
            stats.syncs_completed += 1;
            stats.operations_sent += request.len() as u64;
            stats.inserts_resolved += ids.len() as u64;
            stats.last_sync_time = Some(Instant::now());
        }
        info!(
            table = %self.table,
            operations = request.len(),
            inserts = ids.len(),
            "operations applied"
        );
        Ok(SyncOutcome::Synced {
            operations: request.len(),
            inserts_resolved: ids.len(),
        })
    }

    fn reject_edit(&self, err: &SyncError) {
        let context = ErrorContext {
            table: self.table,
            operation_count: 0,
            trigger: SyncTrigger::LocalEdit,
        };
        self.reporter.report(&context, err);
    }

    fn fail(&self, trigger: SyncTrigger, operation_count: usize, err: &SyncError) {
        {
            let mut state = self.state.lock();
            if state.phase.is_active() {
                state.phase = self.settled_phase();
            }
        }
        {
            let mut stats = self.stats.write();
            stats.syncs_failed += 1;
            stats.last_error = Some(err.to_string());
        }
        let context = ErrorContext {
            table: self.table,
            operation_count,
            trigger,
        };
        self.reporter.report(&context, err);
    }

    fn shutdown(self: &Arc<Self>) -> Option<JoinHandle<SyncResult<SyncOutcome>>> {
        self.debouncer.cancel();
        {
            let mut state = self.state.lock();
            if state.closed {
                return None;
            }
            state.closed = true;
            if !state.has_unsynced_changes() {
                state.phase = self.settled_phase();
                return None;
            }
            if !state.phase.is_active() {
                state.phase = SyncPhase::Flushing;
            }
        }

        let Some(runtime) = self.debouncer.runtime() else {
            warn!(table = %self.table, "no tokio runtime; unsynced edits dropped at teardown");
            return None;
        };
        let _context = runtime.enter();
        let shared = Arc::clone(self);
        let Ok(gate) = Arc::clone(&self.sync_gate).try_lock_owned() else {
            warn!(table = %self.table, "teardown flush queued behind the call in flight");
            return Some(runtime.spawn(async move { shared.sync(SyncTrigger::Teardown).await }));
        };

        // Polled once here: the batch is prepared and the call issued before
        // teardown returns.
        let mut flush = Box::pin(async move {
            let _gate = gate;
            shared.run(SyncTrigger::Teardown).await
        });
        match (&mut flush).now_or_never() {
            Some(result) => Some(runtime.spawn(async move { result })),
            None => {
                debug!(table = %self.table, "teardown flush issued; completing in background");
                Some(runtime.spawn(flush))
            }
        }
    }
}

fn remap<F>(documents: Vec<Document<F>>, ids: &HashMap<DocumentId, DocumentId>) -> Vec<Document<F>> {
    if ids.is_empty() {
        return documents;
    }
    documents
        .into_iter()
        .map(|mut doc| {
            if let Some(id) = ids.get(&doc.id) {
                doc.id = id.clone();
            }
            doc
        })
        .collect()
}

/// Keeps one table's live models in sync with the server.
///
/// Dropping a `TableSync` issues a final call for unsynced edits when
/// [`SyncConfig::flush_on_drop`] is set.
pub struct TableSync<M: Model, T: OperationsTransport> {
    shared: Arc<Shared<M, T>>,
}

impl<M: Model, T: OperationsTransport> TableSync<M, T> {
    /// Creates an orchestrator that reports failures through `tracing`.
    ///
    /// Debounce timers run on the tokio runtime current at construction.
    pub fn new(table: TableName, config: SyncConfig, transport: Arc<T>) -> Self {
        Self::with_reporter(table, config, transport, Arc::new(TracingReporter))
    }

    /// Creates an orchestrator with a custom error reporter.
    pub fn with_reporter(
        table: TableName,
        config: SyncConfig,
        transport: Arc<T>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let debouncer = Debouncer::new(config.debounce);
        Self {
            shared: Arc::new(Shared {
                table,
                config,
                transport,
                reporter,
                models: RwLock::new(ModelStore::new()),
                state: Mutex::new(TableState {
                    server_snapshot: Vec::new(),
                    pending: None,
                    stale: false,
                    phase: SyncPhase::Idle,
                    closed: false,
                }),
                debouncer,
                sync_gate: Arc::new(tokio::sync::Mutex::new(())),
                stats: RwLock::new(SyncStats::default()),
            }),
        }
    }

    /// The table this orchestrator syncs.
    pub fn table(&self) -> TableName {
        self.shared.table
    }

    /// Current phase.
    pub fn phase(&self) -> SyncPhase {
        self.shared.state.lock().phase
    }

    /// Statistics so far.
    pub fn stats(&self) -> SyncStats {
        self.shared.stats.read().clone()
    }

    /// The last state the server is known to hold.
    pub fn server_snapshot(&self) -> Vec<Document<M::Payload>> {
        self.shared.state.lock().server_snapshot.clone()
    }

    /// The last observed local snapshot not yet confirmed by the server.
    pub fn pending_snapshot(&self) -> Option<Vec<Document<M::Payload>>> {
        self.shared.state.lock().pending.clone()
    }

    /// Returns true while the view is marked as showing outdated data.
    pub fn is_stale(&self) -> bool {
        self.shared.state.lock().stale
    }

    /// Marks the view stale or fresh. Syncs are skipped while stale; clearing
    /// the flag re-arms the debounce if edits are still unsynced.
    pub fn set_stale(&self, stale: bool) {
        self.shared.set_stale(stale);
    }

    /// Merges an authoritative server result into the live models.
    ///
    /// A push equal to the tracked server snapshot is ignored. Failures are
    /// reported and returned; the models are left as they were.
    pub fn absorb_server_push(&self, documents: Vec<Document<M::Payload>>) -> SyncResult<PushOutcome> {
        self.shared.absorb(documents)
    }

    /// Creates a model for new fields under a temporary id.
    ///
    /// Fields no model can hold are reported and rejected.
    pub fn insert(&self, fields: M::Payload) -> SyncResult<ModelHandle> {
        let model = M::from_document(Document::local(fields))
            .inspect_err(|err| self.shared.reject_edit(err))?;
        Ok(self.shared.edit(|models| models.insert(model)))
    }

    /// Edits the fields of the document behind `handle`. Returns `Ok(None)`
    /// for a stale handle.
    ///
    /// An edit that changes which kind of model the document needs rebuilds
    /// the model under the same handle. An edit no model can hold is reported
    /// and rejected, leaving the model as it was.
    pub fn update<R>(
        &self,
        handle: ModelHandle,
        f: impl FnOnce(&mut M::Payload) -> R,
    ) -> SyncResult<Option<R>> {
        self.shared
            .edit(|models| models.update(handle, f))
            .inspect_err(|err| self.shared.reject_edit(err))
    }

    /// Removes the model behind `handle`.
    pub fn remove(&self, handle: ModelHandle) -> bool {
        self.shared.edit(|models| models.remove(handle).is_some())
    }

    /// Runs an arbitrary edit. All mutations inside `f` are observed as one
    /// committed change.
    ///
    /// `f` must not call back into this `TableSync`.
    pub fn edit<R>(&self, f: impl FnOnce(&mut ModelStore<M>) -> R) -> R {
        self.shared.edit(f)
    }

    /// Reads the live models.
    pub fn with_models<R>(&self, f: impl FnOnce(&ModelStore<M>) -> R) -> R {
        f(&self.shared.models.read())
    }

    /// Copy of the document behind `handle`.
    pub fn document(&self, handle: ModelHandle) -> Option<Document<M::Payload>> {
        self.shared
            .models
            .read()
            .get(handle)
            .map(|model| model.document().clone())
    }

    /// Handle of the model currently addressed by `id`.
    pub fn handle_of(&self, id: &DocumentId) -> Option<ModelHandle> {
        self.shared.models.read().handle_of(id)
    }

    /// Returns true if local edits have not been confirmed by the server.
    pub fn has_unsynced_changes(&self) -> bool {
        self.shared.state.lock().has_unsynced_changes()
    }

    /// Whether leaving now would lose edits.
    pub fn before_unload(&self) -> UnloadDecision {
        if self.has_unsynced_changes() {
            UnloadDecision::Confirm {
                tables: vec![self.table()],
            }
        } else {
            UnloadDecision::Allow
        }
    }

    /// Cancels the debounce timer and syncs now.
    pub async fn flush(&self) -> SyncResult<SyncOutcome> {
        self.shared.debouncer.cancel();
        self.shared.sync(SyncTrigger::Manual).await
    }

    /// Stops observing edits and sends whatever is unsynced.
    ///
    /// Unless a call is already in flight, the final call is issued before
    /// this returns; the handle resolves once the server answers. Returns
    /// `None` if nothing needed sending or the orchestrator was already shut
    /// down.
    pub fn shutdown(&self) -> Option<JoinHandle<SyncResult<SyncOutcome>>> {
        self.shared.shutdown()
    }
}

impl<M: Model, T: OperationsTransport> UnloadGuard for TableSync<M, T> {
    fn table(&self) -> TableName {
        TableSync::table(self)
    }

    fn has_unsynced_changes(&self) -> bool {
        TableSync::has_unsynced_changes(self)
    }

    fn shutdown(&self) -> Option<JoinHandle<SyncResult<SyncOutcome>>> {
        TableSync::shutdown(self)
    }
}

impl<M: Model, T: OperationsTransport> Drop for TableSync<M, T> {
    fn drop(&mut self) {
        if self.shared.config.flush_on_drop {
            self.shutdown();
        } else {
            self.shared.debouncer.cancel();
        }
    }
}
