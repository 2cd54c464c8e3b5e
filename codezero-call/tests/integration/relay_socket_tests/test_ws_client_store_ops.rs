use codezero_call::WsRelayClient;
use codezero_core::relay::{RelayError, RelayPath, RelayStore};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{eventually, spawn_relay_server};

#[tokio::test]
async fn test_ws_client_store_ops() {
    init_tracing();

    let (url, service) = spawn_relay_server().await;
    let client = WsRelayClient::connect(&url).await.unwrap();
    let path = RelayPath::parse("rooms/7/iceCandidates").unwrap();

    let mut sub = client.subscribe(&path).await.unwrap();
    assert_eq!(sub.next().await.unwrap(), None);

    client
        .write(&path.child("a").unwrap(), json!({"candidate": "x"}))
        .await
        .unwrap();
    assert_eq!(
        sub.next().await.unwrap(),
        Some(json!({"a": {"candidate": "x"}}))
    );

    client.remove(&RelayPath::parse("rooms/7").unwrap()).await.unwrap();
    assert_eq!(sub.next().await.unwrap(), None);
    assert_eq!(service.connection_count(), 1);

    // Unsubscribing stops the server-side listener
    drop(sub);
    let relay = service.relay().clone();
    eventually(|| relay.subscriber_count() == 0).await;

    client.close();
    eventually(|| service.connection_count() == 0).await;

    let res = client.write(&path, json!(1)).await;
    assert!(matches!(res, Err(RelayError::Disconnected)));
}

#[tokio::test]
async fn test_ws_client_disconnect_runs_removals() {
    init_tracing();

    let (url, service) = spawn_relay_server().await;
    let owner = WsRelayClient::connect(&url).await.unwrap();
    let watcher = WsRelayClient::connect(&url).await.unwrap();
    let room = RelayPath::parse("rooms/5").unwrap();

    owner.write(&room, json!({"createdAt": 5})).await.unwrap();
    owner.remove_on_disconnect(&room).await.unwrap();

    let mut sub = watcher.subscribe(&room).await.unwrap();
    assert_eq!(sub.next().await.unwrap(), Some(json!({"createdAt": 5})));

    drop(owner);

    assert_eq!(sub.next().await.unwrap(), None);
    assert_eq!(service.relay().get(&room), None);
}

#[tokio::test]
async fn test_ws_client_rejects_unreachable_relay() {
    init_tracing();

    let res = WsRelayClient::connect("ws://127.0.0.1:1/relay").await;
    assert!(matches!(res, Err(RelayError::Transport(_))));
}
