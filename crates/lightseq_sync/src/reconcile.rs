//! Merging authoritative server documents into live models.

use crate::error::SyncResult;
use crate::model::{Model, ModelStore, Slot};
use lightseq_protocol::{index_by_id, Document, DocumentId};
use std::collections::HashSet;

/// What a reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Models created for new server documents.
    pub added: usize,
    /// Models dropped because the server no longer has them.
    pub removed: usize,
    /// Models whose document was overwritten in place.
    pub updated: usize,
    /// Models rebuilt because they could not absorb the server document.
    pub replaced: usize,
}

impl ReconcileSummary {
    /// Returns true if the collection changed at all.
    pub fn is_changed(&self) -> bool {
        self.added + self.removed + self.updated + self.replaced > 0
    }
}

/// Applies an authoritative document list onto `store`.
///
/// - server documents with no local model get a new model appended,
/// - local models absent from `server` are removed,
/// - matching models absorb the server document in place when `can_reuse`
///   allows it (keeping their handle), otherwise they are replaced at the same
///   position by a model built with `create` (under a new handle).
///
/// Every model is built before the store is touched, so a failing `create`
/// leaves the store unchanged; on success all changes land as one transition
/// with a single revision bump.
pub fn reconcile<M, C, R>(
    store: &mut ModelStore<M>,
    server: &[Document<M::Payload>],
    mut create: C,
    can_reuse: R,
) -> SyncResult<ReconcileSummary>
where
    M: Model,
    C: FnMut(Document<M::Payload>) -> SyncResult<M>,
    R: Fn(&M, &Document<M::Payload>) -> bool,
{
    let server_index = index_by_id(server);
    let mut summary = ReconcileSummary::default();

    let mut replacements = Vec::with_capacity(store.slots.len());
    let mut additions = Vec::new();
    {
        let local_ids: HashSet<&DocumentId> = store
            .slots
            .iter()
            .map(|slot| &slot.model.document().id)
            .collect();

        for slot in &store.slots {
            let replacement = match server_index.get(&slot.model.document().id) {
                Some(doc) if !can_reuse(&slot.model, doc) => Some(create((*doc).clone())?),
                _ => None,
            };
            replacements.push(replacement);
        }

        let mut added_ids = HashSet::new();
        for doc in server {
            if !local_ids.contains(&doc.id) && added_ids.insert(&doc.id) {
                additions.push(create(doc.clone())?);
            }
        }
    }

    let old = std::mem::take(&mut store.slots);
    let mut next = Vec::with_capacity(server.len());

    for (mut slot, replacement) in old.into_iter().zip(replacements) {
        let Some(doc) = server_index.get(&slot.model.document().id) else {
            summary.removed += 1;
            continue;
        };
        match replacement {
            Some(model) => {
                let handle = store.allocate_handle();
                next.push(Slot { handle, model });
                summary.replaced += 1;
            }
            None => {
                if slot.model.document() != *doc {
                    *slot.model.document_mut() = (*doc).clone();
                    summary.updated += 1;
                }
                next.push(slot);
            }
        }
    }

    for model in additions {
        let handle = store.allocate_handle();
        next.push(Slot { handle, model });
        summary.added += 1;
    }

    store.slots = next;
    if summary.is_changed() {
        store.touch();
    }
    Ok(summary)
}
