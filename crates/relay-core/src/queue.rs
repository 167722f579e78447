//! Event queue: the single hand-off point between readers and the dispatch loop.

use crate::{ConnectionHandle, ConnectionId, RelayError, Result};
use relay_types::{Action, ClientPayload};
use tokio::sync::mpsc;

/// Inbound event, tagged with the connection it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub action: Action,
    pub username: String,
    pub message: String,
    /// Set by the reader that decoded the event, never by the peer.
    pub source: ConnectionId,
}

impl Event {
    pub fn from_payload(payload: ClientPayload, source: ConnectionId) -> Self {
        Self {
            action: payload.kind(),
            username: payload.username,
            message: payload.message,
            source,
        }
    }

    pub fn username(source: ConnectionId, username: impl Into<String>) -> Self {
        Self {
            action: Action::Username,
            username: username.into(),
            message: String::new(),
            source,
        }
    }

    pub fn broadcast(source: ConnectionId, message: impl Into<String>) -> Self {
        Self {
            action: Action::Broadcast,
            username: String::new(),
            message: message.into(),
            source,
        }
    }

    pub fn left(source: ConnectionId) -> Self {
        Self {
            action: Action::Left,
            username: String::new(),
            message: String::new(),
            source,
        }
    }
}

/// Work item for the dispatch loop.
#[derive(Debug)]
pub enum Command {
    /// A connection finished its upgrade and should enter the registry.
    Connect(ConnectionHandle),
    Event(Event),
    /// A connection's reader stopped. Unlike a `left` event this is silent
    /// when the connection is already gone.
    Disconnect(ConnectionId),
}

/// Cloneable producer side of the queue. Pushing never blocks.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Command>,
}

impl EventQueue {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Queue registration of a new connection.
    ///
    /// Must happen before the connection's reader starts so the dispatch loop
    /// sees the join before any of its events.
    pub fn connect(&self, handle: ConnectionHandle) -> Result<()> {
        self.tx
            .send(Command::Connect(handle))
            .map_err(|_| RelayError::QueueClosed)
    }

    pub fn submit(&self, event: Event) -> Result<()> {
        self.tx
            .send(Command::Event(event))
            .map_err(|_| RelayError::QueueClosed)
    }

    /// Report that the reader for `id` has stopped.
    pub fn disconnect(&self, id: ConnectionId) -> Result<()> {
        self.tx
            .send(Command::Disconnect(id))
            .map_err(|_| RelayError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
