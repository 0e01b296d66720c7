//! Error types for the device client.

use crate::client::DeviceState;
use thiserror::Error;

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors that can occur while driving a device.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// An operation that needs a connection was made in another state.
    #[error("device not connected (state: {state})")]
    NotConnected {
        /// State at the time of the call.
        state: DeviceState,
    },

    /// The requested state change is not allowed.
    #[error("invalid device transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: DeviceState,
        /// Requested state.
        to: DeviceState,
    },

    /// Payload does not fit in one frame.
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed frame.
    #[error("codec error: {0}")]
    Codec(String),

    /// Control payload could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeviceError {
    /// Returns true if the error is a misuse of the client rather than a
    /// network failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            DeviceError::NotConnected { .. }
                | DeviceError::InvalidTransition { .. }
                | DeviceError::PayloadTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DeviceError::NotConnected {
            state: DeviceState::Connecting,
        };
        assert_eq!(err.to_string(), "device not connected (state: connecting)");
        assert!(err.is_contract_violation());

        let err = DeviceError::PayloadTooLarge { len: 2000, max: 1440 };
        assert!(err.to_string().contains("2000"));

        let err: DeviceError = std::io::Error::other("boom").into();
        assert!(!err.is_contract_violation());
    }
}
