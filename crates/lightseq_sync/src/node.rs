//! Specialised models for timeline nodes.

use crate::error::{SyncError, SyncResult};
use crate::model::Model;
use lightseq_protocol::{Document, NodeFields, NodeKind};

/// Built-in effects a node can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Hue rotation.
    Rainbow,
    /// On/off flashing.
    Strobe,
    /// Moving dot.
    Chase,
}

impl Effect {
    /// Resolves an effect by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rainbow" => Some(Effect::Rainbow),
            "strobe" => Some(Effect::Strobe),
            "chase" => Some(Effect::Chase),
            _ => None,
        }
    }
}

/// The behaviour a node model was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHandler {
    /// Solid colour node.
    Solid,
    /// Fade node.
    Fade,
    /// Effect node.
    Effect(Effect),
}

impl NodeHandler {
    /// Picks the handler for a node kind.
    pub fn resolve(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Color { .. } => Some(NodeHandler::Solid),
            NodeKind::Fade { .. } => Some(NodeHandler::Fade),
            NodeKind::Effect { name, .. } => Effect::from_name(name).map(NodeHandler::Effect),
        }
    }
}

/// A timeline node whose handler is fixed at construction.
///
/// A server update that changes the node's handler cannot be absorbed in
/// place; reconciliation builds a new model instead.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeModel {
    document: Document<NodeFields>,
    handler: NodeHandler,
}

impl NodeModel {
    /// The handler this model runs.
    pub fn handler(&self) -> NodeHandler {
        self.handler
    }
}

impl Model for NodeModel {
    type Payload = NodeFields;

    fn from_document(document: Document<NodeFields>) -> SyncResult<Self> {
        let handler =
            NodeHandler::resolve(&document.fields.kind).ok_or_else(|| SyncError::MissingHandler {
                id: document.id.clone(),
                reason: format!("no handler for node kind `{:?}`", document.fields.kind),
            })?;
        Ok(Self { document, handler })
    }

    fn can_absorb(&self, document: &Document<NodeFields>) -> bool {
        NodeHandler::resolve(&document.fields.kind) == Some(self.handler)
    }

    fn document(&self) -> &Document<NodeFields> {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document<NodeFields> {
        &mut self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelStore;
    use lightseq_protocol::{DocumentId, JsonObject};

    fn node(id: &str, kind: NodeKind) -> Document<NodeFields> {
        Document::new(
            id,
            0.0,
            NodeFields {
                sequence_id: DocumentId::new("s1"),
                order: 0.0,
                start_ms: 0,
                duration_ms: 100,
                kind,
            },
        )
    }

    #[test]
    fn resolves_handlers() {
        let model = NodeModel::from_document(node("n1", NodeKind::Color { color: [1, 2, 3] }))
            .unwrap();
        assert_eq!(model.handler(), NodeHandler::Solid);

        let model = NodeModel::from_document(node(
            "n2",
            NodeKind::Effect {
                name: "strobe".into(),
                params: JsonObject::new(),
            },
        ))
        .unwrap();
        assert_eq!(model.handler(), NodeHandler::Effect(Effect::Strobe));
    }

    #[test]
    fn unknown_effect_has_no_handler() {
        let result = NodeModel::from_document(node(
            "n3",
            NodeKind::Effect {
                name: "sparkle".into(),
                params: JsonObject::new(),
            },
        ));
        assert!(matches!(result, Err(SyncError::MissingHandler { id, .. }) if id.as_str() == "n3"));
    }

    #[test]
    fn absorbs_only_same_handler() {
        let model = NodeModel::from_document(node("n1", NodeKind::Color { color: [0, 0, 0] }))
            .unwrap();

        assert!(model.can_absorb(&node("n1", NodeKind::Color { color: [9, 9, 9] })));
        assert!(!model.can_absorb(&node(
            "n1",
            NodeKind::Fade {
                from: [0, 0, 0],
                to: [255, 255, 255],
            }
        )));
    }

    #[test]
    fn kind_edit_rebuilds_under_same_handle() {
        let mut store = ModelStore::new();
        let handle = store.insert(
            NodeModel::from_document(node("n1", NodeKind::Color { color: [1, 1, 1] })).unwrap(),
        );

        store
            .update(handle, |fields| {
                fields.kind = NodeKind::Effect {
                    name: "chase".into(),
                    params: JsonObject::new(),
                }
            })
            .unwrap();

        let model = store.get(handle).unwrap();
        assert_eq!(model.handler(), NodeHandler::Effect(Effect::Chase));
        assert_eq!(model.document().id.as_str(), "n1");
    }

    #[test]
    fn edit_to_unknown_effect_is_rejected() {
        let mut store = ModelStore::new();
        let handle = store.insert(
            NodeModel::from_document(node("n1", NodeKind::Color { color: [1, 1, 1] })).unwrap(),
        );
        let revision = store.revision();

        let result = store.update(handle, |fields| {
            fields.kind = NodeKind::Effect {
                name: "sparkle".into(),
                params: JsonObject::new(),
            }
        });

        assert!(matches!(result, Err(SyncError::MissingHandler { id, .. }) if id.as_str() == "n1"));
        let model = store.get(handle).unwrap();
        assert_eq!(model.handler(), NodeHandler::Solid);
        assert_eq!(model.document().fields.kind, NodeKind::Color { color: [1, 1, 1] });
        assert_eq!(store.revision(), revision);
    }
}
