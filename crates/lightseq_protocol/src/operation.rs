//! Operations sent to the remote document store.

use crate::document::{DocumentId, Fields, JsonObject, CREATION_TIME_FIELD, ID_FIELD};
use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an operation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Overwrite fields of an existing document.
    Patch,
    /// Remove an existing document.
    Delete,
    /// Create a new document.
    Insert,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Patch => "patch",
            OperationKind::Delete => "delete",
            OperationKind::Insert => "insert",
        })
    }
}

/// A single change against one table.
///
/// `values` never contains `_id` or `_creationTime`: payload types carry only
/// table fields, and [`Operation::to_wire`] rejects reserved keys in untyped
/// payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operation<F> {
    /// Overwrite the named fields of an existing server document.
    Patch {
        /// Server id of the document.
        id: DocumentId,
        /// Full current payload.
        values: F,
    },
    /// Remove an existing server document.
    Delete {
        /// Server id of the document.
        id: DocumentId,
    },
    /// Create a new server document.
    Insert {
        /// Client-local placeholder id, resolved by the server's response.
        #[serde(rename = "tempId")]
        temp_id: DocumentId,
        /// Payload of the new document.
        values: F,
    },
}

/// An operation with an untyped JSON payload, as sent over the wire.
pub type WireOperation = Operation<JsonObject>;

impl<F> Operation<F> {
    /// Creates a patch operation.
    pub fn patch(id: DocumentId, values: F) -> Self {
        Operation::Patch { id, values }
    }

    /// Creates a delete operation.
    pub fn delete(id: DocumentId) -> Self {
        Operation::Delete { id }
    }

    /// Creates an insert operation.
    pub fn insert(temp_id: DocumentId, values: F) -> Self {
        Operation::Insert { temp_id, values }
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Patch { .. } => OperationKind::Patch,
            Operation::Delete { .. } => OperationKind::Delete,
            Operation::Insert { .. } => OperationKind::Insert,
        }
    }

    /// Returns the id this operation targets (the temporary id for inserts).
    pub fn target(&self) -> &DocumentId {
        match self {
            Operation::Patch { id, .. } | Operation::Delete { id } => id,
            Operation::Insert { temp_id, .. } => temp_id,
        }
    }

    /// Returns the payload, if the operation carries one.
    pub fn values(&self) -> Option<&F> {
        match self {
            Operation::Patch { values, .. } | Operation::Insert { values, .. } => Some(values),
            Operation::Delete { .. } => None,
        }
    }
}

impl<F: Fields> Operation<F> {
    /// Converts a typed operation into its wire form.
    pub fn to_wire(&self) -> ProtocolResult<WireOperation> {
        let encode = |id: &DocumentId, values: &F| -> ProtocolResult<JsonObject> {
            match serde_json::to_value(values)? {
                serde_json::Value::Object(map) => {
                    check_reserved(id, &map)?;
                    Ok(map)
                }
                _ => Err(ProtocolError::NotAnObject { id: id.to_string() }),
            }
        };

        Ok(match self {
            Operation::Patch { id, values } => Operation::Patch {
                id: id.clone(),
                values: encode(id, values)?,
            },
            Operation::Delete { id } => Operation::Delete { id: id.clone() },
            Operation::Insert { temp_id, values } => Operation::Insert {
                temp_id: temp_id.clone(),
                values: encode(temp_id, values)?,
            },
        })
    }
}

/// Rejects payloads that carry identity or metadata fields.
pub(crate) fn check_reserved(id: &DocumentId, values: &JsonObject) -> ProtocolResult<()> {
    for field in [ID_FIELD, CREATION_TIME_FIELD] {
        if values.contains_key(field) {
            return Err(ProtocolError::ReservedField {
                field,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
