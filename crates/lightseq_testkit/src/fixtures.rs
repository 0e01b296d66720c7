//! Test fixtures and document helpers.
//!
//! Provides shorthand for building documents from JSON literals, typed sample
//! tables, and temporary snapshot files.

use lightseq_protocol::{
    Document, DocumentId, Fields, JsonObject, NodeFields, NodeKind, PlaylistFields,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds an untyped document from a JSON literal with an `_id`.
///
/// # Example
///
/// ```rust,ignore
/// let d = doc(json!({"_id": "p1", "name": "Old"}));
/// ```
pub fn doc(value: Value) -> Document<JsonObject> {
    serde_json::from_value(value).expect("literal is a document with an `_id`")
}

/// Builds a list of untyped documents.
pub fn docs(values: impl IntoIterator<Item = Value>) -> Vec<Document<JsonObject>> {
    values.into_iter().map(doc).collect()
}

/// Unwraps a JSON object literal.
pub fn fields(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Directory of snapshot files, removed on drop.
pub struct TempSnapshots {
    dir: TempDir,
}

impl TempSnapshots {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `documents` as a JSON array to `name` and returns its path.
    pub fn write<F: Fields>(&self, name: &str, documents: &[Document<F>]) -> PathBuf {
        let path = self.dir.path().join(name);
        let json = serde_json::to_vec_pretty(documents).expect("documents serialize");
        std::fs::write(&path, json).expect("Failed to write snapshot");
        path
    }

    /// Writes raw text to `name` and returns its path.
    pub fn write_raw(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write snapshot");
        path
    }
}

impl Default for TempSnapshots {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed sample tables.
pub mod scenarios {
    use super::*;

    /// A playlist of a project.
    pub fn playlist(id: &str, project_id: &str, name: &str) -> Document<PlaylistFields> {
        Document::new(
            id,
            0.0,
            PlaylistFields {
                project_id: DocumentId::new(project_id),
                name: name.to_string(),
                sequence_ids: Vec::new(),
            },
        )
    }

    /// `count` solid-colour nodes laid end to end on one sequence.
    pub fn color_nodes(sequence_id: &str, count: usize) -> Vec<Document<NodeFields>> {
        (0..count)
            .map(|i| {
                let shade = (i % 256) as u8;
                Document::new(
                    format!("n{i}"),
                    i as f64,
                    NodeFields {
                        sequence_id: DocumentId::new(sequence_id),
                        order: i as f64,
                        start_ms: i as u64 * 100,
                        duration_ms: 100,
                        kind: NodeKind::Color {
                            color: [shade, 0, 255 - shade],
                        },
                    },
                )
            })
            .collect()
    }
}
