//! Typed payloads for each table.

use crate::document::{DocumentId, JsonObject};
use crate::table::{TableName, TableSchema};
use serde::{Deserialize, Serialize};

/// Payload of a `projects` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFields {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TableSchema for ProjectFields {
    const TABLE: TableName = TableName::Projects;
}

/// Payload of a `playlists` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistFields {
    /// Owning project.
    pub project_id: DocumentId,
    /// Display name.
    pub name: String,
    /// Sequences played in order.
    #[serde(default)]
    pub sequence_ids: Vec<DocumentId>,
}

impl TableSchema for PlaylistFields {
    const TABLE: TableName = TableName::Playlists;
}

/// Payload of a `sequences` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceFields {
    /// Owning project.
    pub project_id: DocumentId,
    /// Display name.
    pub name: String,
    /// Total running time.
    pub duration_ms: u64,
    /// Position in the project's sequence list.
    #[serde(default)]
    pub order: f64,
}

impl TableSchema for SequenceFields {
    const TABLE: TableName = TableName::Sequences;
}

/// What a timeline node does. The `type` tag is the discriminant that decides
/// whether a live model can absorb a server update in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    /// Solid colour.
    Color {
        /// RGB value.
        color: [u8; 3],
    },
    /// Linear fade between two colours.
    Fade {
        /// Start colour.
        from: [u8; 3],
        /// End colour.
        to: [u8; 3],
    },
    /// Named effect with free-form parameters.
    Effect {
        /// Effect name.
        name: String,
        /// Effect parameters.
        #[serde(default)]
        params: JsonObject,
    },
}

impl NodeKind {
    /// Returns the wire discriminant.
    pub fn discriminant(&self) -> &'static str {
        match self {
            NodeKind::Color { .. } => "color",
            NodeKind::Fade { .. } => "fade",
            NodeKind::Effect { .. } => "effect",
        }
    }
}

/// Payload of a `nodes` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFields {
    /// Owning sequence.
    pub sequence_id: DocumentId,
    /// Ordering key within the sequence; display order follows this, not
    /// array position.
    pub order: f64,
    /// Offset from the start of the sequence.
    pub start_ms: u64,
    /// Length of the node.
    pub duration_ms: u64,
    /// Node behaviour.
    pub kind: NodeKind,
}

impl TableSchema for NodeFields {
    const TABLE: TableName = TableName::Nodes;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;

    #[test]
    fn node_document_from_wire() {
        let doc: Document<NodeFields> = serde_json::from_value(json!({
            "_id": "n1",
            "_creationTime": 3.0,
            "sequenceId": "s1",
            "order": 1.5,
            "startMs": 0,
            "durationMs": 250,
            "kind": {"type": "fade", "from": [0, 0, 0], "to": [255, 0, 0]},
        }))
        .unwrap();

        assert_eq!(doc.fields.kind.discriminant(), "fade");
        assert_eq!(doc.fields.sequence_id.as_str(), "s1");
        assert_eq!(NodeFields::TABLE, TableName::Nodes);
    }

    #[test]
    fn project_description_is_optional() {
        let doc: Document<ProjectFields> =
            serde_json::from_value(json!({"_id": "p1", "name": "Garden"})).unwrap();
        assert_eq!(doc.fields.description, None);

        let value = serde_json::to_value(&doc.fields).unwrap();
        assert_eq!(value, json!({"name": "Garden"}));
    }
}
