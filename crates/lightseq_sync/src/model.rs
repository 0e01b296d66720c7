//! Live, editable models and the arena that owns them.
//!
//! Models are addressed by a stable [`ModelHandle`]. A model's document id may
//! be temporary until the server acknowledges its insert; the id is then
//! rewritten in place while the handle stays valid, so callers that hold
//! handles never observe the identity change.

use crate::error::SyncResult;
use lightseq_protocol::{Document, DocumentId, Fields};

/// A live wrapper around one document.
pub trait Model: Sized + Send + Sync + 'static {
    /// Table payload type.
    type Payload: Fields;

    /// Builds a model for a document. Fails if no model kind handles it.
    fn from_document(document: Document<Self::Payload>) -> SyncResult<Self>;

    /// Returns true if this model can take `document` in place. When false,
    /// reconciliation replaces the model with a freshly built one.
    fn can_absorb(&self, _document: &Document<Self::Payload>) -> bool {
        true
    }

    /// The live document.
    fn document(&self) -> &Document<Self::Payload>;

    /// Mutable access to the live document.
    fn document_mut(&mut self) -> &mut Document<Self::Payload>;
}

/// A model with no behaviour beyond holding its document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentModel<F> {
    document: Document<F>,
}

impl<F: Fields> DocumentModel<F> {
    /// Wraps a document.
    pub fn new(document: Document<F>) -> Self {
        Self { document }
    }
}

impl<F: Fields> Model for DocumentModel<F> {
    type Payload = F;

    fn from_document(document: Document<F>) -> SyncResult<Self> {
        Ok(Self::new(document))
    }

    fn document(&self) -> &Document<F> {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document<F> {
        &mut self.document
    }
}

/// Stable handle to a model in a [`ModelStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(u64);

impl ModelHandle {
    /// Returns the raw handle value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct Slot<M> {
    pub(crate) handle: ModelHandle,
    pub(crate) model: M,
}

/// Ordered arena of live models.
///
/// Every mutation bumps [`ModelStore::revision`], which the orchestrator uses
/// to notice committed edits.
#[derive(Debug)]
pub struct ModelStore<M> {
    pub(crate) slots: Vec<Slot<M>>,
    next_handle: u64,
    revision: u64,
}

impl<M> Default for ModelStore<M> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_handle: 1,
            revision: 0,
        }
    }
}

impl<M: Model> ModelStore<M> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live models.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the store holds no models.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn allocate_handle(&mut self) -> ModelHandle {
        let handle = ModelHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    /// Appends a model and returns its handle.
    pub fn insert(&mut self, model: M) -> ModelHandle {
        let handle = self.allocate_handle();
        self.slots.push(Slot { handle, model });
        self.touch();
        handle
    }

    /// Returns the model behind a handle.
    pub fn get(&self, handle: ModelHandle) -> Option<&M> {
        self.position(handle).map(|i| &self.slots[i].model)
    }

    /// Edits the fields of the model behind a handle. Returns `Ok(None)` for
    /// a stale handle.
    ///
    /// The id and creation time are not editable here. When the edited
    /// document no longer fits the model (see [`Model::can_absorb`]) a new
    /// model is built for it under the same handle; if none can be built the
    /// edit is dropped and the error returned.
    pub fn update<R>(
        &mut self,
        handle: ModelHandle,
        f: impl FnOnce(&mut M::Payload) -> R,
    ) -> SyncResult<Option<R>> {
        let Some(index) = self.position(handle) else {
            return Ok(None);
        };
        let slot = &mut self.slots[index];
        let mut document = slot.model.document().clone();
        let result = f(&mut document.fields);
        if slot.model.can_absorb(&document) {
            *slot.model.document_mut() = document;
        } else {
            slot.model = M::from_document(document)?;
        }
        self.touch();
        Ok(Some(result))
    }

    /// Removes the model behind a handle.
    pub fn remove(&mut self, handle: ModelHandle) -> Option<M> {
        let index = self.position(handle)?;
        let slot = self.slots.remove(index);
        self.touch();
        Some(slot.model)
    }

    /// Finds the handle of the model currently addressed by `id`.
    pub fn handle_of(&self, id: &DocumentId) -> Option<ModelHandle> {
        self.slots
            .iter()
            .find(|slot| &slot.model.document().id == id)
            .map(|slot| slot.handle)
    }

    /// Finds the model currently addressed by `id`.
    pub fn find(&self, id: &DocumentId) -> Option<&M> {
        self.slots
            .iter()
            .map(|slot| &slot.model)
            .find(|model| &model.document().id == id)
    }

    /// Returns the current document id of a model.
    pub fn id_of(&self, handle: ModelHandle) -> Option<&DocumentId> {
        self.get(handle).map(|model| &model.document().id)
    }

    /// Iterates models in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (ModelHandle, &M)> {
        self.slots.iter().map(|slot| (slot.handle, &slot.model))
    }

    /// Rewrites the id of the model addressed by `from`, keeping its handle.
    pub fn rewrite_id(&mut self, from: &DocumentId, to: DocumentId) -> Option<ModelHandle> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| &slot.model.document().id == from)?;
        slot.model.document_mut().id = to;
        let handle = slot.handle;
        self.touch();
        Some(handle)
    }

    /// Structural copy of every live document, in collection order.
    pub fn snapshot(&self) -> Vec<Document<M::Payload>> {
        self.slots
            .iter()
            .map(|slot| slot.model.document().clone())
            .collect()
    }

    fn position(&self, handle: ModelHandle) -> Option<usize> {
        self.slots.iter().position(|slot| slot.handle == handle)
    }
}
