//! Message delivery between the controller and an engine.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Round-trip delivery of one request message.
///
/// Implementations report an unreachable engine (or one that never replies)
/// as [`ClientError::ConnectionFailed`] and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` and wait for the engine's reply
    async fn send(&self, message: Value) -> Result<Value>;
}

/// One request as seen by the engine side of a [`ChannelTransport`].
#[derive(Debug)]
pub struct EngineCall {
    pub message: Value,
    reply: oneshot::Sender<Value>,
}

impl EngineCall {
    /// Answer the request.
    ///
    /// Dropping the call without answering makes the controller see a
    /// connection failure.
    pub fn reply(self, value: Value) {
        if self.reply.send(value).is_err() {
            debug!("Controller went away before the reply");
        }
    }
}

/// In-process transport over `tokio` channels.
///
/// The engine side receives [`EngineCall`]s from the receiver returned by
/// [`ChannelTransport::new`]; it may run on a thread without a runtime and
/// use `blocking_recv`.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    inbox: mpsc::Sender<EngineCall>,
}

impl ChannelTransport {
    /// Create a transport and the engine's end of it.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<EngineCall>) {
        let (inbox, calls) = mpsc::channel(buffer.max(1));
        (Self { inbox }, calls)
    }

    /// Whether the engine side has gone away.
    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, message: Value) -> Result<Value> {
        let (reply, response) = oneshot::channel();

        self.inbox
            .send(EngineCall { message, reply })
            .await
            .map_err(|_| ClientError::ConnectionFailed("engine is not running".into()))?;

        response.await.map_err(|_| {
            ClientError::ConnectionFailed("engine closed the request without a reply".into())
        })
    }
}
