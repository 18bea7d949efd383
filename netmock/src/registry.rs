//! Address registry state.
//!
//! Maps a normalized address to the server bound there and the set of
//! sockets attached to it. The registry is plain state owned by the net;
//! every mutation happens inside one of the net's atomic registry
//! operations, so no endpoint ever observes a partial update.

use std::collections::HashMap;

use crate::server::Server;
use crate::socket::WebSocket;

/// One bound address: its server and the attached peer set.
#[derive(Debug)]
pub(crate) struct AddressEntry {
    pub server: Server,
    pub sockets: Vec<WebSocket>,
}

/// Address -> {server, peers} map.
#[derive(Debug, Default)]
pub(crate) struct AddressRegistry {
    entries: HashMap<String, AddressEntry>,
}

impl AddressRegistry {
    /// Binds `server` to `url`. Returns `false` when the address already
    /// has a server; an address holds at most one listening endpoint.
    pub fn attach_server(&mut self, server: &Server, url: &str) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(
            url.to_string(),
            AddressEntry {
                server: server.clone(),
                sockets: Vec::new(),
            },
        );
        true
    }

    /// Attaches `socket` to the peer set at `url` and returns the server
    /// bound there. Returns `None` when no server is listening or when the
    /// socket is already a member (idempotent rejection, not an error).
    pub fn attach_socket(&mut self, socket: &WebSocket, url: &str) -> Option<Server> {
        let entry = self.entries.get_mut(url)?;
        if entry.sockets.iter().any(|existing| existing == socket) {
            return None;
        }
        entry.sockets.push(socket.clone());
        Some(entry.server.clone())
    }

    /// The server bound at `url`, if any.
    pub fn server_lookup(&self, url: &str) -> Option<Server> {
        self.entries.get(url).map(|entry| entry.server.clone())
    }

    /// Snapshot of the peer set at `url`; empty for unknown addresses.
    pub fn sockets_lookup(&self, url: &str) -> Vec<WebSocket> {
        self.entries
            .get(url)
            .map(|entry| entry.sockets.clone())
            .unwrap_or_default()
    }

    /// Removes the whole entry for `url`, server and peer set alike.
    pub fn remove_server(&mut self, url: &str) {
        self.entries.remove(url);
    }

    /// Detaches one socket from the peer set at `url`; no-op when absent.
    /// Detaching never touches the socket's own state; close paths handle
    /// that explicitly.
    pub fn remove_socket(&mut self, socket: &WebSocket, url: &str) {
        if let Some(entry) = self.entries.get_mut(url) {
            entry.sockets.retain(|existing| existing != socket);
        }
    }

    /// Drops every entry. Used for test isolation between cases.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
