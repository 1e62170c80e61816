//! Error types for rig links

use thiserror::Error;

/// Errors that can occur talking to a rig
#[derive(Debug, Error)]
pub enum LinkError {
    /// I/O error on the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Connection was not established in time
    #[error("timed out connecting to {endpoint} after {timeout_ms}ms")]
    ConnectTimeout {
        /// Address that was being connected to
        endpoint: String,
        /// Configured timeout (milliseconds)
        timeout_ms: u64,
    },

    /// No reply line arrived in time
    #[error("no response within {timeout_ms}ms")]
    ResponseTimeout {
        /// Configured timeout (milliseconds)
        timeout_ms: u64,
    },

    /// Connected, but the rig did not answer the startup query
    #[error("handshake with {endpoint} failed: {reason}")]
    HandshakeFailed {
        /// Address of the rig
        endpoint: String,
        /// What went wrong
        reason: String,
    },

    /// Peer closed the connection
    #[error("connection closed by peer")]
    Closed,

    /// Command could not be encoded
    #[error("encoding error: {0}")]
    Encode(#[from] vfo_protocol::EncodeError),
}

impl LinkError {
    /// Check whether this error is a reply timeout
    pub fn is_response_timeout(&self) -> bool {
        matches!(self, LinkError::ResponseTimeout { .. })
    }
}
