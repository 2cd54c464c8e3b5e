//! [`RelayStore`] backed by a `codezero-relay` server over WebSocket.

use async_trait::async_trait;
use codezero_core::relay::{
    RelayError, RelayPath, RelayReply, RelayRequest, RelayStore, Snapshot, Subscription,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

enum Outgoing {
    Frame(RelayRequest),
    Close,
}

#[derive(Default)]
struct Shared {
    next_id: AtomicU64,
    closed: AtomicBool,
    pending: DashMap<u64, oneshot::Sender<Result<(), RelayError>>>,
    subscriptions: DashMap<u64, mpsc::UnboundedSender<Snapshot>>,
}

impl Shared {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn dispatch(&self, reply: RelayReply) {
        match reply {
            RelayReply::Ack { id } => match self.pending.remove(&id) {
                Some((_, tx)) => {
                    let _ = tx.send(Ok(()));
                }
                None => debug!("Ack for untracked request {}", id),
            },
            RelayReply::Error { id, message } => match self.pending.remove(&id) {
                Some((_, tx)) => {
                    let _ = tx.send(Err(RelayError::rejected(message)));
                }
                None => warn!("Relay error for untracked request {}: {}", id, message),
            },
            RelayReply::Snapshot { sub, value } => {
                let delivered = self
                    .subscriptions
                    .get(&sub)
                    .map(|tx| tx.send(value).is_ok());
                if delivered == Some(false) {
                    self.subscriptions.remove(&sub);
                }
            }
        }
    }

    /// Fails outstanding requests and ends every subscription stream.
    fn shut_down(&self) {
        self.closed.store(true, Ordering::SeqCst);

        let ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, tx)) = self.pending.remove(&id) {
                let _ = tx.send(Err(RelayError::Disconnected));
            }
        }
        self.subscriptions.clear();
    }
}

/// Client side of the relay WebSocket protocol.
///
/// Dropping the client closes the socket, which makes the server run this
/// client's remove-on-disconnect registrations.
pub struct WsRelayClient {
    shared: Arc<Shared>,
    out_tx: mpsc::UnboundedSender<Outgoing>,
}

impl WsRelayClient {
    pub async fn connect(url: &str) -> Result<Self, RelayError> {
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outgoing>();
        let shared = Arc::new(Shared::default());

        tokio::spawn(async move {
            while let Some(out) = out_rx.recv().await {
                match out {
                    Outgoing::Frame(req) => {
                        let text = match serde_json::to_string(&req) {
                            Ok(t) => t,
                            Err(e) => {
                                warn!("Failed to encode relay request: {}", e);
                                continue;
                            }
                        };
                        if sink.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Outgoing::Close => {
                        let _ = sink.close().await;
                        break;
                    }
                }
            }
        });

        let reader_shared = shared.clone();
        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<RelayReply>(&text) {
                        Ok(reply) => reader_shared.dispatch(reply),
                        Err(e) => warn!("Invalid relay frame: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay socket error: {}", e);
                        break;
                    }
                }
            }

            info!("Relay connection closed");
            reader_shared.shut_down();
        });

        Ok(Self { shared, out_tx })
    }

    /// Closes the socket. Outstanding requests fail with
    /// [`RelayError::Disconnected`].
    pub fn close(&self) {
        let _ = self.out_tx.send(Outgoing::Close);
    }

    async fn request(&self, build: impl FnOnce(u64) -> RelayRequest) -> Result<(), RelayError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Disconnected);
        }

        let id = self.shared.next_id();
        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(id, tx);

        if self.out_tx.send(Outgoing::Frame(build(id))).is_err() {
            self.shared.pending.remove(&id);
            return Err(RelayError::Disconnected);
        }
        rx.await.map_err(|_| RelayError::Disconnected)?
    }
}

impl Drop for WsRelayClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
impl RelayStore for WsRelayClient {
    async fn subscribe(&self, path: &RelayPath) -> Result<Subscription, RelayError> {
        let sub = self.shared.next_id();
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.subscriptions.insert(sub, tx);

        let path = path.clone();
        if let Err(e) = self
            .request(|id| RelayRequest::Subscribe { id, sub, path })
            .await
        {
            self.shared.subscriptions.remove(&sub);
            return Err(e);
        }

        let shared = self.shared.clone();
        let out_tx = self.out_tx.clone();
        Ok(Subscription::new(rx, move || {
            shared.subscriptions.remove(&sub);
            if !shared.closed.load(Ordering::SeqCst) {
                let id = shared.next_id();
                let _ = out_tx.send(Outgoing::Frame(RelayRequest::Unsubscribe { id, sub }));
            }
        }))
    }

    async fn write(&self, path: &RelayPath, value: Value) -> Result<(), RelayError> {
        let path = path.clone();
        self.request(|id| RelayRequest::Write { id, path, value })
            .await
    }

    async fn remove(&self, path: &RelayPath) -> Result<(), RelayError> {
        let path = path.clone();
        self.request(|id| RelayRequest::Remove { id, path }).await
    }

    async fn remove_on_disconnect(&self, path: &RelayPath) -> Result<(), RelayError> {
        let path = path.clone();
        self.request(|id| RelayRequest::RemoveOnDisconnect { id, path })
            .await
    }
}
