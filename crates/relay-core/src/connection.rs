//! Connection identity and the writable half of a client connection.

use crate::WriteError;
use futures::{Sink, SinkExt};
use relay_types::Response;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Opaque identity of one accepted connection. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sink of serialized JSON text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = WriteError> + Send>>;

/// Writable, closable handle for one live connection.
///
/// The registry owns the handle for as long as the client is known. Readers
/// only ever see the [`ConnectionId`].
pub struct ConnectionHandle {
    id: ConnectionId,
    sink: FrameSink,
}

impl ConnectionHandle {
    pub fn new<S>(id: ConnectionId, sink: S) -> Self
    where
        S: Sink<String, Error = WriteError> + Send + 'static,
    {
        Self {
            id,
            sink: Box::pin(sink),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Serialize and write one response.
    pub async fn send(&mut self, response: &Response) -> Result<(), WriteError> {
        let text = response.to_json()?;
        self.send_text(text).await
    }

    /// Write an already serialized frame.
    pub async fn send_text(&mut self, text: String) -> Result<(), WriteError> {
        self.sink.send(text).await
    }

    /// Write a frame, giving up after `limit` when one is set.
    pub async fn send_text_within(
        &mut self,
        text: String,
        limit: Option<Duration>,
    ) -> Result<(), WriteError> {
        match limit {
            Some(limit) => tokio::time::timeout(limit, self.sink.send(text))
                .await
                .map_err(|_| WriteError::Timeout(limit))?,
            None => self.sink.send(text).await,
        }
    }

    /// Close the connection. Errors are logged, there is nothing left to do with them.
    pub async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            debug!(target: "relay::ws", "Close failed for connection {}: {}", self.id, e);
        }
    }

    /// Close, giving up after `limit` when one is set.
    pub async fn close_within(&mut self, limit: Option<Duration>) {
        match limit {
            Some(limit) => {
                if tokio::time::timeout(limit, self.close()).await.is_err() {
                    debug!(target: "relay::ws", "Close timed out for connection {}", self.id);
                }
            }
            None => self.close().await,
        }
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

/// In-memory handles for unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use futures::channel::mpsc;
    use futures::StreamExt;

    /// Handle whose frames land in the returned receiver.
    pub fn channel_handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded::<String>();
        let sink = tx.sink_map_err(|e| WriteError::Transport(e.to_string()));
        (ConnectionHandle::new(ConnectionId::new(), sink), rx)
    }

    /// Handle whose peer is already gone, so every write fails.
    pub fn broken_handle() -> ConnectionHandle {
        let (handle, rx) = channel_handle();
        drop(rx);
        handle
    }

    /// Handle whose writes never complete.
    pub fn stalled_handle() -> ConnectionHandle {
        let sink = futures::sink::unfold((), |(), _text: String| async move {
            futures::future::pending::<()>().await;
            Ok::<_, WriteError>(())
        });
        ConnectionHandle::new(ConnectionId::new(), sink)
    }

    /// Collect every frame received so far, decoded as responses.
    pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Response> {
        let mut out = Vec::new();
        while let Ok(Some(text)) = rx.try_next() {
            out.push(serde_json::from_str(&text).expect("valid response json"));
        }
        out
    }

    /// Wait for the next frame.
    pub async fn next_response(rx: &mut mpsc::UnboundedReceiver<String>) -> Response {
        let text = rx.next().await.expect("connection still open");
        serde_json::from_str(&text).expect("valid response json")
    }
}
