//! Error types for the relay core.

use crate::ConnectionId;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Event queue closed")]
    QueueClosed,

    #[error("Connection already registered: {0}")]
    AlreadyRegistered(ConnectionId),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),
}

/// Failure to deliver one frame to one client. Always terminal for that client.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Write timed out after {0:?}")]
    Timeout(Duration),
}

/// Why an inbound reader stopped early.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Undecodable payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Event queue closed")]
    QueueClosed,
}
