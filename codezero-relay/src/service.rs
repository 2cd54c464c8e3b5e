use crate::ConnectionId;
use codezero_core::relay::{MemoryRelay, RelayConnection};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

struct RelayInner {
    relay: MemoryRelay,
    /// Open sockets and the store connection each one owns.
    connections: DashMap<ConnectionId, u64>,
}

/// Shared state behind the relay's HTTP handlers.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new(MemoryRelay::new())
    }
}

impl RelayService {
    pub fn new(relay: MemoryRelay) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                relay,
                connections: DashMap::new(),
            }),
        }
    }

    pub fn relay(&self) -> &MemoryRelay {
        &self.inner.relay
    }

    /// Opens a store connection on behalf of a new socket.
    pub fn open(&self, id: ConnectionId) -> RelayConnection {
        let conn = self.inner.relay.connect();
        debug!("Socket {} owns store connection {}", id, conn.id());
        self.inner.connections.insert(id, conn.id());
        conn
    }

    pub fn close(&self, id: &ConnectionId) {
        self.inner.connections.remove(id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }
}
