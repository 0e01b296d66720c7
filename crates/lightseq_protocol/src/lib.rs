//! # lightseq Protocol
//!
//! Wire vocabulary shared by the lightseq client and the remote document store.
//!
//! This crate provides:
//! - `Document` rows with `_id` / `_creationTime` identity fields
//! - Typed per-table schemas (`projects`, `playlists`, `sequences`, `nodes`)
//! - `Operation` (patch, delete, insert-with-temporary-id)
//! - The apply-operations request/response messages
//! - The diff engine that turns two snapshots into operations
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod diff;
mod document;
mod error;
mod messages;
mod operation;
mod schema;
mod table;

pub use diff::{diff, index_by_id};
pub use document::{Document, DocumentId, Fields, JsonObject, CREATION_TIME_FIELD, ID_FIELD};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{ApplyOperationsRequest, ApplyOperationsResponse, InsertResult};
pub use operation::{Operation, OperationKind, WireOperation};
pub use schema::{NodeFields, NodeKind, PlaylistFields, ProjectFields, SequenceFields};
pub use table::{TableName, TableSchema};
