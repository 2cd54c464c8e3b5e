use crate::{ConnectionId, RelayService};
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use codezero_core::relay::{RelayConnection, RelayError, RelayReply, RelayRequest, RelayStore};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: RelayService) {
    let id = ConnectionId::new();
    info!("New relay connection: {}", id);

    let conn = service.open(id.clone());
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelayReply>();

    let mut send_task = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            let json = match serde_json::to_string(&reply) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay reply: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let id = id.clone();

        async move {
            let mut forwards: HashMap<u64, JoinHandle<()>> = HashMap::new();

            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayRequest>(&text) {
                        Ok(req) => handle_request(&conn, &mut forwards, &tx, req).await,
                        Err(e) => warn!("Invalid relay request from {}: {}", id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            for (_, task) in forwards.drain() {
                task.abort();
            }
            conn.disconnect();
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.close(&id);
    info!("Relay connection closed: {}", id);
}

async fn handle_request(
    conn: &RelayConnection,
    forwards: &mut HashMap<u64, JoinHandle<()>>,
    tx: &mpsc::UnboundedSender<RelayReply>,
    req: RelayRequest,
) {
    let id = req.id();

    let result = match req {
        RelayRequest::Subscribe { sub, path, .. } => match conn.subscribe(&path).await {
            Ok(mut subscription) => {
                let tx = tx.clone();
                let task = tokio::spawn(async move {
                    while let Some(value) = subscription.next().await {
                        if tx.send(RelayReply::Snapshot { sub, value }).is_err() {
                            break;
                        }
                    }
                });
                if let Some(old) = forwards.insert(sub, task) {
                    old.abort();
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        RelayRequest::Unsubscribe { sub, .. } => {
            if let Some(task) = forwards.remove(&sub) {
                task.abort();
            }
            Ok(())
        }
        RelayRequest::Write { path, value, .. } => conn.write(&path, value).await,
        RelayRequest::Remove { path, .. } => conn.remove(&path).await,
        RelayRequest::RemoveOnDisconnect { path, .. } => conn.remove_on_disconnect(&path).await,
    };

    let reply = match result {
        Ok(()) => RelayReply::Ack { id },
        Err(e) => reply_error(id, e),
    };
    let _ = tx.send(reply);
}

fn reply_error(id: u64, err: RelayError) -> RelayReply {
    warn!("Relay request {} failed: {}", id, err);
    RelayReply::Error {
        id,
        message: err.to_string(),
    }
}
