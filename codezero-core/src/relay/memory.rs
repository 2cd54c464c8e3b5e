use crate::relay::{RelayError, RelayPath, RelayStore, Snapshot, Subscription};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;

struct Watcher {
    connection: u64,
    path: RelayPath,
    tx: mpsc::UnboundedSender<Snapshot>,
    last: Snapshot,
}

struct TreeState {
    root: Value,
    watchers: HashMap<u64, Watcher>,
    next_watcher: u64,
    next_connection: u64,
    on_disconnect: HashMap<u64, Vec<RelayPath>>,
}

impl TreeState {
    fn lookup(&self, path: &RelayPath) -> Snapshot {
        path.segments()
            .iter()
            .try_fold(&self.root, |node, seg| node.as_object()?.get(seg))
            .cloned()
    }

    fn store(&mut self, path: &RelayPath, value: Value) {
        if value.is_null() {
            self.erase(path);
            return;
        }

        let Some((last, parents)) = path.segments().split_last() else {
            self.root = match value {
                Value::Object(map) => Value::Object(map),
                _ => Value::Object(Map::new()),
            };
            return;
        };

        let mut node = &mut self.root;
        for seg in parents {
            node = object_mut(node)
                .entry(seg.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        object_mut(node).insert(last.clone(), value);
    }

    fn erase(&mut self, path: &RelayPath) {
        if path.is_root() {
            self.root = Value::Object(Map::new());
        } else {
            prune(&mut self.root, path.segments());
        }
    }

    /// Delivers the current value to every watcher whose value changed.
    fn notify(&mut self) {
        let mut gone = Vec::new();
        let root = &self.root;

        for (id, watcher) in self.watchers.iter_mut() {
            let current = watcher
                .path
                .segments()
                .iter()
                .try_fold(root, |node, seg| node.as_object()?.get(seg))
                .cloned();

            if current == watcher.last {
                continue;
            }
            watcher.last = current.clone();
            if watcher.tx.send(current).is_err() {
                gone.push(*id);
            }
        }

        for id in gone {
            self.watchers.remove(&id);
        }
    }
}

fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

/// Removes the value under `segments` and drops parents left empty.
/// Returns true when `node` itself became empty.
fn prune(node: &mut Value, segments: &[String]) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        return true;
    };
    let Value::Object(map) = node else {
        return false;
    };

    if rest.is_empty() {
        map.remove(head);
    } else if let Some(child) = map.get_mut(head) {
        if prune(child, rest) {
            map.remove(head);
        }
    }
    map.is_empty()
}

/// In-process relay store holding a JSON tree.
///
/// Clients talk to it through [`RelayConnection`]s so that remove-on-disconnect
/// registrations have an owner to be tied to.
#[derive(Clone)]
pub struct MemoryRelay {
    state: Arc<Mutex<TreeState>>,
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TreeState {
                root: Value::Object(Map::new()),
                watchers: HashMap::new(),
                next_watcher: 0,
                next_connection: 0,
                on_disconnect: HashMap::new(),
            })),
        }
    }

    pub fn connect(&self) -> RelayConnection {
        let id = {
            let mut state = self.state.lock();
            state.next_connection += 1;
            state.next_connection
        };
        debug!("Relay connection {} opened", id);

        RelayConnection {
            relay: self.clone(),
            id,
            closed: AtomicBool::new(false),
        }
    }

    pub fn get(&self, path: &RelayPath) -> Snapshot {
        self.state.lock().lookup(path)
    }

    /// Number of live subscriptions across all connections.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().watchers.len()
    }

    fn subscribe_as(&self, connection: u64, path: &RelayPath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock();

        state.next_watcher += 1;
        let id = state.next_watcher;
        let current = state.lookup(path);
        let _ = tx.send(current.clone());
        state.watchers.insert(
            id,
            Watcher {
                connection,
                path: path.clone(),
                tx,
                last: current,
            },
        );

        let weak: Weak<Mutex<TreeState>> = Arc::downgrade(&self.state);
        Subscription::new(rx, move || {
            if let Some(state) = weak.upgrade() {
                state.lock().watchers.remove(&id);
            }
        })
    }

    fn set(&self, path: &RelayPath, value: Value) {
        let mut state = self.state.lock();
        state.store(path, value);
        state.notify();
    }

    fn delete(&self, path: &RelayPath) {
        let mut state = self.state.lock();
        state.erase(path);
        state.notify();
    }

    fn close_connection(&self, connection: u64) {
        let mut state = self.state.lock();
        state.watchers.retain(|_, w| w.connection != connection);

        let paths = state.on_disconnect.remove(&connection).unwrap_or_default();
        for path in &paths {
            debug!("Connection {} dropped, removing {}", connection, path);
            state.erase(path);
        }
        state.notify();
    }
}

/// One client's session with a [`MemoryRelay`]. Dropping it behaves like an
/// abrupt disconnect: its listeners stop and its remove-on-disconnect paths
/// are removed.
pub struct RelayConnection {
    relay: MemoryRelay,
    id: u64,
    closed: AtomicBool,
}

impl RelayConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn relay(&self) -> &MemoryRelay {
        &self.relay
    }

    pub fn disconnect(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Relay connection {} closed", self.id);
        self.relay.close_connection(self.id);
    }

    fn ensure_open(&self) -> Result<(), RelayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Disconnected);
        }
        Ok(())
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[async_trait]
impl RelayStore for RelayConnection {
    async fn subscribe(&self, path: &RelayPath) -> Result<Subscription, RelayError> {
        self.ensure_open()?;
        Ok(self.relay.subscribe_as(self.id, path))
    }

    async fn write(&self, path: &RelayPath, value: Value) -> Result<(), RelayError> {
        self.ensure_open()?;
        self.relay.set(path, value);
        Ok(())
    }

    async fn remove(&self, path: &RelayPath) -> Result<(), RelayError> {
        self.ensure_open()?;
        self.relay.delete(path);
        Ok(())
    }

    async fn remove_on_disconnect(&self, path: &RelayPath) -> Result<(), RelayError> {
        self.ensure_open()?;
        self.relay
            .state
            .lock()
            .on_disconnect
            .entry(self.id)
            .or_default()
            .push(path.clone());
        Ok(())
    }
}
