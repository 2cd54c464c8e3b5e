use crate::relay::{RelayError, RelayPath};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Full current value at a subscribed path; `None` when nothing is stored there.
pub type Snapshot = Option<Value>;

/// Path-addressable realtime store used purely as a message relay.
///
/// Subscriptions deliver the entire value at the path on every change, never a
/// diff, so consumers must tolerate redelivery of data they already processed.
#[async_trait]
pub trait RelayStore: Send + Sync + 'static {
    /// Starts listening at `path`. The current value is delivered immediately.
    async fn subscribe(&self, path: &RelayPath) -> Result<Subscription, RelayError>;

    async fn write(&self, path: &RelayPath, value: Value) -> Result<(), RelayError>;

    async fn remove(&self, path: &RelayPath) -> Result<(), RelayError>;

    /// Asks the store to remove `path` once this client's connection drops.
    async fn remove_on_disconnect(&self, path: &RelayPath) -> Result<(), RelayError>;
}

/// Live listener on one relay path. Dropping it unsubscribes.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(
        rx: mpsc::UnboundedReceiver<Snapshot>,
        cancel: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Waits for the next snapshot. `None` once the store stopped delivering.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
