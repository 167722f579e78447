//! Shared application state.

use crate::config::Config;
use relay_core::{Dispatcher, EventQueue};

/// Shared application state.
///
/// Holds only the producer side of the event queue; the registry lives inside
/// the dispatch loop.
pub struct AppState {
    pub queue: EventQueue,
    pub config: Config,
}

impl AppState {
    /// Build the state together with the dispatch loop it feeds. The caller
    /// spawns the dispatcher.
    pub fn new(config: Config) -> (Self, Dispatcher) {
        let (queue, dispatcher) = Dispatcher::new(config.dispatcher_config());
        (Self { queue, config }, dispatcher)
    }
}
