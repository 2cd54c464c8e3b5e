use codezero_call::{CallController, CallPhase, EndReason, StartOutcome};
use codezero_core::relay::MemoryRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::integration::init_tracing;
use crate::utils::{FakeConnector, FakeMedia, StalledRemoveRelay};

#[tokio::test]
async fn test_end_with_unresponsive_relay() {
    init_tracing();

    let relay = MemoryRelay::new();
    let media = FakeMedia::new();
    let controller = CallController::spawn(
        Arc::new(StalledRemoveRelay::new(relay.connect())),
        Arc::new(media.clone()),
        Arc::new(FakeConnector::new("creator")),
    );

    let outcome = controller.start_or_join(None).await.unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));

    timeout(Duration::from_secs(10), controller.end())
        .await
        .expect("end() hung on the relay");

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, CallPhase::Idle);
    assert_eq!(snapshot.last_end, Some(EndReason::Local));
    assert!(media.all_stopped());

    // Still serving commands afterwards.
    let toggled = timeout(Duration::from_secs(1), controller.toggle_camera())
        .await
        .expect("controller stopped answering");
    assert_eq!(toggled, None);
}
