//! Error types for the wire protocol

use thiserror::Error;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message is not an object carrying a string `request` field
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Request name is not part of the protocol
    #[error("Unsupported request: {0}")]
    UnknownRequest(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
