use codezero_call::{CallError, CallPhase, EndReason};
use codezero_core::relay::{MemoryRelay, RelayPath};

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::{FakeMedia, eventually, wait_for_snapshot};

#[tokio::test]
async fn test_end_during_acquisition() {
    init_tracing();

    let relay = MemoryRelay::new();
    let (media, gate) = FakeMedia::gated();
    let peer = create_test_peer(&relay, "creator", media);

    let controller = peer.controller.clone();
    let start = tokio::spawn(async move { controller.start_or_join(None).await });

    wait_for_snapshot(&peer.controller, |s| s.phase == CallPhase::AcquiringMedia).await;

    // Hang up while the permission prompt is still open
    peer.controller.end().await;

    let res = start.await.unwrap();
    assert!(matches!(res, Err(CallError::Cancelled)));

    let snapshot = peer.controller.snapshot();
    assert_eq!(snapshot.phase, CallPhase::Idle);
    assert_eq!(snapshot.last_end, Some(EndReason::Local));

    // The prompt resolves late; its tracks must not outlive the call
    gate.notify_one();
    let media = peer.media.clone();
    eventually(|| !media.issued().is_empty() && media.all_stopped()).await;

    assert_eq!(peer.connector.created(), 0);
    assert_eq!(relay.get(&RelayPath::parse("rooms").unwrap()), None);
    assert_eq!(peer.controller.snapshot().phase, CallPhase::Idle);
}
