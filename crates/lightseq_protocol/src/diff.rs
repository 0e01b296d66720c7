//! Snapshot diffing.
//!
//! [`diff`] turns the last known server snapshot of a table into the
//! operations that make the server match the current local snapshot.

use crate::document::{Document, DocumentId, Fields};
use crate::operation::Operation;
use std::collections::HashMap;

/// Indexes a snapshot by document id. Later duplicates shadow earlier ones.
pub fn index_by_id<F>(documents: &[Document<F>]) -> HashMap<&DocumentId, &Document<F>> {
    documents.iter().map(|doc| (&doc.id, doc)).collect()
}

/// Computes the operations that transform `previous` into `current`.
///
/// - ids only in `previous` become `delete`s,
/// - ids only in `current` become `insert`s whose temporary id is the current id,
/// - ids in both whose documents differ structurally become `patch`es carrying
///   the full current payload, not a per-field delta.
///
/// The output order is deterministic: deletes in `previous` order, then
/// inserts and patches in `current` order.
pub fn diff<F: Fields>(previous: &[Document<F>], current: &[Document<F>]) -> Vec<Operation<F>> {
    if std::ptr::eq(previous, current) {
        return Vec::new();
    }

    let before = index_by_id(previous);
    let after = index_by_id(current);
    let mut operations = Vec::new();

    for doc in previous {
        if !after.contains_key(&doc.id) {
            operations.push(Operation::delete(doc.id.clone()));
        }
    }

    for doc in current {
        match before.get(&doc.id) {
            None => operations.push(Operation::insert(doc.id.clone(), doc.fields.clone())),
            Some(old) if *old != doc => {
                operations.push(Operation::patch(doc.id.clone(), doc.fields.clone()))
            }
            Some(_) => {}
        }
    }

    operations
}
