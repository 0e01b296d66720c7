//! Documents and document identities.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the identity field on the wire.
pub const ID_FIELD: &str = "_id";

/// Name of the creation timestamp field on the wire.
pub const CREATION_TIME_FIELD: &str = "_creationTime";

/// Untyped document payload.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

const TEMP_PREFIX: &str = "tmp_";

/// Identity of a document.
///
/// Either a permanent id assigned by the server, or a temporary id generated
/// on the client for a document whose insert has not been acknowledged yet.
/// Both live in the same string domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an id received from the server (or from a fixture).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh temporary id. Temporary ids are never reused.
    pub fn temporary() -> Self {
        Self(format!("{TEMP_PREFIX}{}", uuid::Uuid::new_v4().simple()))
    }

    /// Returns true if this id was produced by [`DocumentId::temporary`].
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_PREFIX)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Bounds every document payload type satisfies.
///
/// Payloads never carry `_id` or `_creationTime`; those live on [`Document`].
/// Equality must be structural: two payloads with the same serialisable
/// content compare equal.
pub trait Fields:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Fields for T where
    T: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// A row of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<F> {
    /// Document identity.
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(rename = "_creationTime", default)]
    pub creation_time: f64,
    /// Table-specific fields.
    #[serde(flatten)]
    pub fields: F,
}

impl<F: Fields> Document<F> {
    /// Creates a document.
    pub fn new(id: impl Into<DocumentId>, creation_time: f64, fields: F) -> Self {
        Self {
            id: id.into(),
            creation_time,
            fields,
        }
    }

    /// Creates a document that only exists locally, under a temporary id.
    pub fn local(fields: F) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default();
        Self::new(DocumentId::temporary(), now, fields)
    }

    /// Returns the payload without identity or metadata fields.
    pub fn values(&self) -> &F {
        &self.fields
    }

    /// Returns a copy of this document under a different id.
    pub fn with_id(&self, id: DocumentId) -> Self {
        Self {
            id,
            creation_time: self.creation_time,
            fields: self.fields.clone(),
        }
    }
}
