//! Error types for the sync engine.

use lightseq_protocol::{DocumentId, ProtocolError};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Server rejected the operation batch.
    #[error("server rejected operations: {0}")]
    ServerRejected(String),

    /// Malformed request or response.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No model could be built for a document.
    #[error("no model handler for document {id}: {reason}")]
    MissingHandler {
        /// Document that could not be materialised.
        id: DocumentId,
        /// Why no handler applies.
        reason: String,
    },

    /// An API was used outside its contract.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Document payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Not connected.
    #[error("not connected to server")]
    NotConnected,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::NotConnected => true,
            _ => false,
        }
    }
}
