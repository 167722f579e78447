//! Client registry: every known connection and its display name.
//!
//! Owned by the dispatch loop. Nothing else holds a reference to it, so it
//! needs no locking.

use crate::{ConnectionHandle, ConnectionId, RelayError, Result};
use std::collections::{BTreeSet, HashMap};

struct ClientEntry {
    handle: ConnectionHandle,
    /// Empty until the client announces a username.
    name: String,
}

#[derive(Default)]
pub struct Registry {
    clients: HashMap<ConnectionId, ClientEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Add a freshly upgraded connection with an empty name.
    pub fn register(&mut self, handle: ConnectionHandle) -> Result<()> {
        let id = handle.id();
        if self.clients.contains_key(&id) {
            return Err(RelayError::AlreadyRegistered(id));
        }
        self.clients.insert(
            id,
            ClientEntry {
                handle,
                name: String::new(),
            },
        );
        Ok(())
    }

    /// Rename a known connection. Unknown ids are left alone and return false.
    pub fn set_name(&mut self, id: ConnectionId, name: impl Into<String>) -> bool {
        match self.clients.get_mut(&id) {
            Some(entry) => {
                entry.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn name(&self, id: ConnectionId) -> Option<&str> {
        self.clients.get(&id).map(|entry| entry.name.as_str())
    }

    /// Remove a connection, handing back its handle so the caller can close it.
    pub fn remove(&mut self, id: ConnectionId) -> Option<ConnectionHandle> {
        self.clients.remove(&id).map(|entry| entry.handle)
    }

    /// Sorted, de-duplicated names of every client that has announced one.
    pub fn roster(&self) -> Vec<String> {
        self.clients
            .values()
            .filter(|entry| !entry.name.is_empty())
            .map(|entry| entry.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub(crate) fn handles_mut(&mut self) -> impl Iterator<Item = &mut ConnectionHandle> {
        self.clients.values_mut().map(|entry| &mut entry.handle)
    }
}
