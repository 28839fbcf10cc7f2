//! Error types for the engine

use mediamix_core::ProtocolError;
use thiserror::Error;

/// Engine errors
///
/// Malformed numeric settings are never errors: they are normalized by
/// [`mediamix_core::Settings`]. Duplicate source taps are prevented by the
/// graph's membership check rather than reported.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Inbound message could not be decoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Request name is not handled (only surfaced under the `reject` policy)
    #[error("Unsupported request: {0}")]
    UnsupportedRequest(String),

    /// The shared processing context could not be created
    #[error("Processing context unavailable: {0}")]
    ContextUnavailable(String),

    /// The audio primitive refused to route an element
    #[error("Audio graph error: {0}")]
    Graph(String),

    /// Host document could not be queried
    #[error("Document error: {0}")]
    Document(String),
}

impl EngineError {
    /// Create an audio graph error
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph(msg.into())
    }

    /// Create a context creation error
    pub fn context_unavailable(msg: impl Into<String>) -> Self {
        Self::ContextUnavailable(msg.into())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
