//! In-memory document store standing in for the server.
//!
//! Applies operation batches the way the hosted store does: each batch is
//! all-or-nothing, inserts get fresh `srv_<n>` ids and a creation time, and
//! patches or deletes on unknown ids reject the whole batch.

use async_trait::async_trait;
use lightseq_protocol::{
    ApplyOperationsRequest, ApplyOperationsResponse, Document, DocumentId, Fields, InsertResult,
    JsonObject, Operation, TableName,
};
use lightseq_sync::{OperationsTransport, SyncError, SyncResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Creation time of the first inserted document, in milliseconds.
pub const BASE_CREATION_TIME: f64 = 1_700_000_000_000.0;

/// A server-side document store held in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    tables: Mutex<HashMap<TableName, Vec<Document<JsonObject>>>>,
    next_id: AtomicU64,
    calls: AtomicU64,
    failures: Mutex<Vec<SyncError>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a table's contents.
    pub fn seed(&self, table: TableName, documents: Vec<Document<JsonObject>>) {
        self.tables.lock().insert(table, documents);
    }

    /// Replaces a table's contents with typed documents.
    pub fn seed_typed<F: Fields>(&self, table: TableName, documents: &[Document<F>]) {
        let raw = documents.iter().map(to_raw).collect();
        self.seed(table, raw);
    }

    /// Raw contents of a table, in insertion order.
    pub fn raw(&self, table: TableName) -> Vec<Document<JsonObject>> {
        self.tables.lock().get(&table).cloned().unwrap_or_default()
    }

    /// Typed contents of a table, as a server push would deliver them.
    pub fn documents<F: Fields>(&self, table: TableName) -> Vec<Document<F>> {
        self.raw(table)
            .into_iter()
            .map(|doc| {
                let value = serde_json::to_value(doc).expect("document serializes");
                serde_json::from_value(value).expect("stored document matches the schema")
            })
            .collect()
    }

    /// Makes the next call fail with `error` without touching any table.
    pub fn fail_next(&self, error: SyncError) {
        self.failures.lock().push(error);
    }

    /// Number of calls received, including failed ones.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn apply(
        &self,
        request: &ApplyOperationsRequest,
    ) -> SyncResult<ApplyOperationsResponse> {
        request.validate()?;

        let mut tables = self.tables.lock();
        let mut rows = tables.get(&request.table).cloned().unwrap_or_default();
        let mut inserts = Vec::new();

        for op in &request.operations {
            match op {
                Operation::Insert { temp_id, values } => {
                    let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                    let id = DocumentId::new(format!("srv_{n}"));
                    let creation_time = BASE_CREATION_TIME + n as f64;
                    rows.push(Document::new(id.clone(), creation_time, values.clone()));
                    inserts.push(InsertResult::new(temp_id.clone(), id));
                }
                Operation::Patch { id, values } => {
                    let row = rows
                        .iter_mut()
                        .find(|row| &row.id == id)
                        .ok_or_else(|| missing(request.table, id))?;
                    row.fields = values.clone();
                }
                Operation::Delete { id } => {
                    let index = rows
                        .iter()
                        .position(|row| &row.id == id)
                        .ok_or_else(|| missing(request.table, id))?;
                    rows.remove(index);
                }
            }
        }

        tables.insert(request.table, rows);
        Ok(ApplyOperationsResponse::new(inserts))
    }
}

#[async_trait]
impl OperationsTransport for MemoryDocumentStore {
    async fn apply_operations(
        &self,
        request: ApplyOperationsRequest,
    ) -> SyncResult<ApplyOperationsResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().pop();
        if let Some(err) = failure {
            return Err(err);
        }
        self.apply(&request)
    }
}

fn missing(table: TableName, id: &DocumentId) -> SyncError {
    SyncError::ServerRejected(format!("no document {id} in {table}"))
}

fn to_raw<F: Fields>(doc: &Document<F>) -> Document<JsonObject> {
    let value = serde_json::to_value(doc).expect("document serializes");
    serde_json::from_value(value).expect("document is an object")
}
