//! Inbound reader: one per connection, turns frames into queued events.

use crate::queue::{Event, EventQueue};
use crate::{ConnectionId, ReadError};
use futures::{Stream, StreamExt};
use relay_types::ClientPayload;
use std::fmt::Display;
use tracing::{debug, error, info, trace, warn};

/// Transport-neutral view of one received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
    /// Peer sent a close frame.
    Close,
    /// Ping/pong and similar; carries no payload for us.
    Control,
}

/// How a reader ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEnd {
    /// Peer sent a close frame.
    Closed,
    /// The underlying stream ended.
    Eof,
}

/// Final state of a supervised reader task.
#[derive(Debug)]
pub enum ReaderExit {
    Ended(ReadEnd),
    Failed(ReadError),
    Panicked,
    Cancelled,
}

/// Read frames until the connection ends or something goes wrong.
///
/// Every decoded payload is tagged with `source` and pushed onto the queue in
/// the order it was read. The first undecodable payload or transport error
/// ends the loop; nothing is retried.
pub async fn read_loop<S, E>(
    source: ConnectionId,
    mut frames: S,
    queue: &EventQueue,
) -> Result<ReadEnd, ReadError>
where
    S: Stream<Item = Result<InboundFrame, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = frames.next().await {
        let payload = match frame.map_err(|e| ReadError::Transport(e.to_string()))? {
            InboundFrame::Text(text) => ClientPayload::from_json(&text)?,
            InboundFrame::Binary(bytes) => ClientPayload::from_slice(&bytes)?,
            InboundFrame::Close => return Ok(ReadEnd::Closed),
            InboundFrame::Control => continue,
        };

        trace!(target: "relay::ws", "Read {:?} from {}", payload.action, source);
        queue
            .submit(Event::from_payload(payload, source))
            .map_err(|_| ReadError::QueueClosed)?;
    }
    Ok(ReadEnd::Eof)
}

/// Run [`read_loop`] on its own task and log how it ended.
///
/// A panic inside the reader stays inside its task. When
/// `prune_on_disconnect` is set a [`Command::Disconnect`] is queued for the
/// connection afterwards; otherwise the registry only learns about the
/// departure when a later write to it fails.
///
/// [`Command::Disconnect`]: crate::Command::Disconnect
pub async fn supervise_reader<S, E>(
    source: ConnectionId,
    frames: S,
    queue: EventQueue,
    prune_on_disconnect: bool,
) -> ReaderExit
where
    S: Stream<Item = Result<InboundFrame, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let task_queue = queue.clone();
    let task = tokio::spawn(async move { read_loop(source, frames, &task_queue).await });

    let exit = match task.await {
        Ok(Ok(end)) => {
            info!(target: "relay::ws", "Reader for {} finished ({:?})", source, end);
            ReaderExit::Ended(end)
        }
        Ok(Err(e)) => {
            warn!(target: "relay::ws", "Reader for {} stopped: {}", source, e);
            ReaderExit::Failed(e)
        }
        Err(e) if e.is_panic() => {
            error!(target: "relay::ws", "Reader for {} panicked: {}", source, e);
            ReaderExit::Panicked
        }
        Err(e) => {
            debug!(target: "relay::ws", "Reader for {} cancelled: {}", source, e);
            ReaderExit::Cancelled
        }
    };

    if prune_on_disconnect && queue.disconnect(source).is_err() {
        debug!(target: "relay::ws", "Queue closed, could not report departure of {}", source);
    }

    exit
}
