//! Dispatch loop: the only place the registry is mutated.
//!
//! Commands are handled strictly one at a time. A roster or chat response is
//! built and fully broadcast before the next command is taken off the queue,
//! so every response reflects exactly the events processed so far.

use crate::broadcast::{broadcast_all, BroadcastReport};
use crate::queue::{Command, Event, EventQueue};
use crate::{ConnectionHandle, ConnectionId, Registry};
use relay_types::{Action, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configuration for the dispatch loop.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Per-client write timeout during broadcasts. `None` waits forever.
    pub write_timeout: Option<Duration>,
}

pub struct Dispatcher {
    registry: Registry,
    rx: mpsc::UnboundedReceiver<Command>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create the dispatch loop and the queue that feeds it.
    pub fn new(config: DispatcherConfig) -> (EventQueue, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            registry: Registry::new(),
            rx,
            config,
        };
        (EventQueue::new(tx), dispatcher)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run the loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands until every queue handle has been dropped.
    pub async fn run(mut self) {
        info!(target: "relay::dispatch", "Dispatch loop started");
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
        info!(target: "relay::dispatch", "Dispatch loop stopped, all producers gone");
    }

    /// Take the next queued command and process it. Returns `false` once the
    /// queue is closed and empty.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(command) => {
                self.handle(command).await;
                true
            }
            None => false,
        }
    }

    /// Process one command. Returns the broadcast it triggered, if any.
    pub async fn handle(&mut self, command: Command) -> Option<BroadcastReport> {
        match command {
            Command::Connect(handle) => {
                self.register(handle);
                None
            }
            Command::Event(event) => self.handle_event(event).await,
            Command::Disconnect(id) => {
                if self.remove(id).await {
                    let roster = Response::list_users(self.registry.roster());
                    Some(self.broadcast(&roster).await)
                } else {
                    debug!(target: "relay::dispatch", "Reader for {} stopped after removal", id);
                    None
                }
            }
        }
    }

    /// Remove and close `id`. Returns `false` if it was not registered.
    async fn remove(&mut self, id: ConnectionId) -> bool {
        match self.registry.remove(id) {
            Some(mut handle) => {
                handle.close_within(self.config.write_timeout).await;
                info!(
                    target: "relay::dispatch",
                    "Client {} left ({} connected)",
                    id,
                    self.registry.len()
                );
                true
            }
            None => false,
        }
    }

    fn register(&mut self, handle: ConnectionHandle) {
        let id = handle.id();
        match self.registry.register(handle) {
            Ok(()) => info!(
                target: "relay::dispatch",
                "Client {} joined ({} connected)",
                id,
                self.registry.len()
            ),
            Err(e) => warn!(target: "relay::dispatch", "Ignoring join: {}", e),
        }
    }

    async fn handle_event(&mut self, event: Event) -> Option<BroadcastReport> {
        let source = event.source;
        let response = match event.action {
            Action::Username => {
                if self.registry.set_name(source, event.username.as_str()) {
                    debug!(target: "relay::dispatch", "Client {} is now {:?}", source, event.username);
                } else {
                    debug!(target: "relay::dispatch", "Username from unregistered client {}", source);
                }
                Response::list_users(self.registry.roster())
            }
            Action::Left => {
                if !self.remove(source).await {
                    debug!(target: "relay::dispatch", "Left from unregistered client {}", source);
                }
                Response::list_users(self.registry.roster())
            }
            Action::Broadcast => match self.registry.name(source) {
                Some(name) => Response::chat(name, &event.message),
                None => {
                    debug!(target: "relay::dispatch", "Dropping message from unregistered client {}", source);
                    return None;
                }
            },
            Action::Unknown(action) => {
                debug!(target: "relay::dispatch", "Ignoring unknown action {:?} from {}", action, source);
                return None;
            }
        };

        Some(self.broadcast(&response).await)
    }

    #[cfg(test)]
    pub(crate) fn try_next_command(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }

    /// Fan `response` out to every registered connection.
    pub async fn broadcast(&mut self, response: &Response) -> BroadcastReport {
        broadcast_all(&mut self.registry, response, self.config.write_timeout).await
    }
}
