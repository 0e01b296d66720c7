//! Messages of the apply-operations RPC.

use crate::document::DocumentId;
use crate::error::{ProtocolError, ProtocolResult};
use crate::operation::{check_reserved, Operation, WireOperation};
use crate::table::TableName;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Request to apply a batch of operations to one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyOperationsRequest {
    /// Target table.
    pub table: TableName,
    /// Operations, all scoped to `table`.
    pub operations: Vec<WireOperation>,
}

impl ApplyOperationsRequest {
    /// Creates a new request.
    pub fn new(table: TableName, operations: Vec<WireOperation>) -> Self {
        Self { table, operations }
    }

    /// Checks the batch invariants: every id / temporary id appears in at most
    /// one operation, and no payload carries identity or metadata fields.
    pub fn validate(&self) -> ProtocolResult<()> {
        let mut seen = HashSet::with_capacity(self.operations.len());
        for op in &self.operations {
            let target = op.target();
            if !seen.insert(target) {
                return Err(ProtocolError::DuplicateId(target.to_string()));
            }
            if let Some(values) = op.values() {
                check_reserved(target, values)?;
            }
        }
        Ok(())
    }

    /// Returns the temporary ids of all inserts in the batch.
    pub fn temp_ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Insert { temp_id, .. } => Some(temp_id),
            _ => None,
        })
    }

    /// Returns the number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Server-assigned id for one accepted insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResult {
    /// Temporary id the client sent.
    #[serde(rename = "tempId")]
    pub temp_id: DocumentId,
    /// Permanent id assigned by the server.
    #[serde(rename = "_id")]
    pub id: DocumentId,
}

impl InsertResult {
    /// Creates an insert result.
    pub fn new(temp_id: impl Into<DocumentId>, id: impl Into<DocumentId>) -> Self {
        Self {
            temp_id: temp_id.into(),
            id: id.into(),
        }
    }
}

/// Response of the apply-operations RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOperationsResponse {
    /// One entry per accepted insert, in any order.
    #[serde(default)]
    pub inserts: Vec<InsertResult>,
}

impl ApplyOperationsResponse {
    /// Creates a response.
    pub fn new(inserts: Vec<InsertResult>) -> Self {
        Self { inserts }
    }

    /// Builds the temporary id → permanent id map, matched against the
    /// request that produced this response.
    ///
    /// The server may list inserts in any order; results for temporary ids the
    /// request never sent, or listed twice, are rejected.
    pub fn id_map(
        &self,
        request: &ApplyOperationsRequest,
    ) -> ProtocolResult<HashMap<DocumentId, DocumentId>> {
        let sent: HashSet<&DocumentId> = request.temp_ids().collect();
        let mut map = HashMap::with_capacity(self.inserts.len());
        for result in &self.inserts {
            if !sent.contains(&result.temp_id) {
                return Err(ProtocolError::UnknownTempId(result.temp_id.to_string()));
            }
            if map
                .insert(result.temp_id.clone(), result.id.clone())
                .is_some()
            {
                return Err(ProtocolError::DuplicateId(result.temp_id.to_string()));
            }
        }
        Ok(map)
    }
}
