//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while building, encoding or validating protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A payload did not encode to a JSON object.
    #[error("values for {id} must encode to a JSON object")]
    NotAnObject {
        /// Id or temporary id the payload belongs to.
        id: String,
    },

    /// An identity or metadata field appeared inside an operation payload.
    #[error("reserved field `{field}` in values for {id}")]
    ReservedField {
        /// Offending field name.
        field: &'static str,
        /// Id or temporary id the payload belongs to.
        id: String,
    },

    /// The same id was targeted twice within one batch.
    #[error("duplicate id {0} in operation batch")]
    DuplicateId(String),

    /// The server answered with an insert result for an unknown temporary id.
    #[error("insert result for unknown temporary id {0}")]
    UnknownTempId(String),

    /// Unknown table name.
    #[error("unknown table: {0}")]
    UnknownTable(String),
}
