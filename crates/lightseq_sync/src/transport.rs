//! Transport abstraction for the apply-operations RPC.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use lightseq_protocol::{ApplyOperationsRequest, ApplyOperationsResponse, InsertResult, Operation};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Semaphore;

/// Sends operation batches to the remote document store.
///
/// The orchestrator imposes no timeout of its own; implementations decide how
/// long a call may stay pending.
#[async_trait]
pub trait OperationsTransport: Send + Sync + 'static {
    /// Applies `request.operations` to `request.table` and returns the ids
    /// assigned to accepted inserts.
    async fn apply_operations(
        &self,
        request: ApplyOperationsRequest,
    ) -> SyncResult<ApplyOperationsResponse>;
}

/// A mock transport for testing.
///
/// Responses are taken from a queue; when the queue is empty every insert is
/// acknowledged with a fresh `srv_<n>` id. Calls can be held open with
/// [`MockTransport::pause`] to exercise edits made while a sync is in flight.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    responses: Mutex<VecDeque<SyncResult<ApplyOperationsResponse>>>,
    requests: Mutex<Vec<ApplyOperationsRequest>>,
    next_id: AtomicU64,
    paused: AtomicBool,
    gate: Semaphore,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            paused: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    /// Queues the response for a future call.
    pub fn push_response(&self, response: SyncResult<ApplyOperationsResponse>) {
        self.responses.lock().push_back(response);
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Holds subsequent calls open until [`MockTransport::release`].
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Lets one held call complete.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Stops holding calls and lets every held call complete.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ApplyOperationsRequest> {
        self.requests.lock().clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn acknowledge_inserts(&self, request: &ApplyOperationsRequest) -> ApplyOperationsResponse {
        let inserts = request
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Insert { temp_id, .. } => {
                    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                    Some(InsertResult::new(temp_id.clone(), format!("srv_{n}")))
                }
                _ => None,
            })
            .collect();
        ApplyOperationsResponse::new(inserts)
    }
}

#[async_trait]
impl OperationsTransport for MockTransport {
    async fn apply_operations(
        &self,
        request: ApplyOperationsRequest,
    ) -> SyncResult<ApplyOperationsResponse> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SyncError::NotConnected);
        }
        self.requests.lock().push(request.clone());

        if self.paused.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| SyncError::transport_fatal("mock transport closed"))?;
            permit.forget();
        }

        let queued = self.responses.lock().pop_front();
        match queued {
            Some(response) => response,
            None => Ok(self.acknowledge_inserts(&request)),
        }
    }
}
