//! Error types for the controller request layer.

use mediamix_core::ProtocolError;
use thiserror::Error;

/// Errors that can occur when talking to an engine.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The engine could not be reached or never answered
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The engine answered with something the request does not expect
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Message could not be encoded or decoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Whether the controller should show its disconnected state
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(ProtocolError::Serialization(e))
    }
}

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, ClientError>;
