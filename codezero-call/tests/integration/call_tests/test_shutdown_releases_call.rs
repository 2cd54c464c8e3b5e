use codezero_call::{CallController, StartOutcome};
use codezero_core::relay::{MemoryRelay, RelayPath};
use std::sync::Arc;

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{FakeMedia, eventually};

#[tokio::test]
async fn test_shutdown_releases_call() {
    init_tracing();

    let relay = MemoryRelay::new();
    let peer = create_test_peer(&relay, "creator", FakeMedia::new());

    let StartOutcome::Started { room_id, .. } = peer.controller.start_or_join(None).await.unwrap()
    else {
        panic!("Call did not start");
    };

    let controller: CallController = Arc::try_unwrap(peer.controller)
        .ok()
        .expect("Controller still shared");
    controller.shutdown().await;

    assert!(peer.media.all_stopped());
    assert_eq!(relay.get(&RelayPath::room(&room_id)), None);
    assert_eq!(relay.subscriber_count(), 0);
}

#[tokio::test]
async fn test_dropping_handle_releases_call() {
    init_tracing();

    let relay = MemoryRelay::new();
    let peer = create_test_peer(&relay, "creator", FakeMedia::new());

    let StartOutcome::Started { room_id, .. } = peer.controller.start_or_join(None).await.unwrap()
    else {
        panic!("Call did not start");
    };

    drop(peer.controller);

    let media = peer.media.clone();
    eventually(|| media.all_stopped()).await;
    eventually(|| relay.get(&RelayPath::room(&room_id)).is_none()).await;
}
