//! Core of the relay: connection registry, event queue, dispatch loop and
//! broadcaster.
//!
//! Readers push [`Event`]s through an [`EventQueue`]; a single [`Dispatcher`]
//! task owns the [`Registry`] and is the only thing that changes it.

mod broadcast;
mod connection;
mod dispatch;
mod error;
mod queue;
mod reader;
mod registry;

pub use broadcast::{broadcast_all, BroadcastReport};
pub use connection::{ConnectionHandle, ConnectionId, FrameSink};
pub use dispatch::{Dispatcher, DispatcherConfig};
pub use error::{ReadError, RelayError, WriteError};
pub use queue::{Command, Event, EventQueue};
pub use reader::{read_loop, supervise_reader, InboundFrame, ReadEnd, ReaderExit};
pub use registry::Registry;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
