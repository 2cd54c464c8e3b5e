use codezero_call::{CallPhase, EndReason, StartOutcome};
use codezero_core::relay::{MemoryRelay, RelayPath};

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::FakeMedia;

#[tokio::test]
async fn test_start_while_active_ends_call() {
    init_tracing();

    let relay = MemoryRelay::new();
    let peer = create_test_peer(&relay, "creator", FakeMedia::new());

    let StartOutcome::Started { room_id, .. } = peer.controller.start_or_join(None).await.unwrap()
    else {
        panic!("Call did not start");
    };

    // Pressing the call button again hangs up
    let outcome = peer.controller.start_or_join(None).await.unwrap();
    assert_eq!(outcome, StartOutcome::Ended);

    let snapshot = peer.controller.snapshot();
    assert_eq!(snapshot.phase, CallPhase::Idle);
    assert_eq!(snapshot.last_end, Some(EndReason::Local));
    assert_eq!(relay.get(&RelayPath::room(&room_id)), None);

    // And a third press starts a new call with a new negotiation object
    let outcome = peer.controller.start_or_join(None).await.unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));
    assert_eq!(peer.connector.created(), 2);

    peer.controller.end().await;
}
