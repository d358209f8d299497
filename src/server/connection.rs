//! Live socket tracking.
//!
//! Each accepted socket gets a [`ConnectionId`] and an unbounded channel
//! drained by its writer task. Delivering an event is a channel push, so it
//! never waits on the network.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::state::{Outbound, ServerEvent};

/// Opaque handle the session uses to address a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A connected socket.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,

    /// Peer address
    pub remote: SocketAddr,

    /// Events delivered so far
    pub sent: u64,

    outbox: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    /// Queue an event; false once the writer has gone away.
    pub fn send(&mut self, event: ServerEvent) -> bool {
        if self.outbox.send(event).is_err() {
            return false;
        }
        self.sent += 1;
        true
    }
}

/// Connection manager - tracks every open socket.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: HashMap<ConnectionId, Connection>,
    next_id: u64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a socket and hand out its id.
    pub fn register(
        &mut self,
        remote: SocketAddr,
        outbox: mpsc::UnboundedSender<ServerEvent>,
    ) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.connections.insert(
            id,
            Connection {
                id,
                remote,
                sent: 0,
                outbox,
            },
        );
        id
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Stop tracking a socket. Dropping its sender lets the writer drain and exit.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    /// Push events to their targets in order. Returns how many were queued.
    pub fn deliver(&mut self, outbound: Vec<Outbound<ConnectionId>>) -> usize {
        let mut delivered = 0;
        for Outbound { to, event } in outbound {
            let action = event.action();
            let Some(conn) = self.connections.get_mut(&to) else {
                tracing::debug!(conn = %to, action, "unknown connection, event dropped");
                continue;
            };
            if conn.send(event) {
                delivered += 1;
            } else {
                tracing::debug!(conn = %to, action, "writer closed, event dropped");
            }
        }
        delivered
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }
}
