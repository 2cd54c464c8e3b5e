use codezero_call::{CallPhase, EndReason};
use codezero_core::relay::{MemoryRelay, RelayPath};

use crate::integration::signaling_tests::connected_pair;
use crate::integration::{init_tracing, wait_idle};

#[tokio::test]
async fn test_remote_hangup_ends_call() {
    init_tracing();

    let relay = MemoryRelay::new();
    let (creator, joiner, room_id) = connected_pair(&relay).await;

    joiner.controller.end().await;

    let snapshot = wait_idle(&creator).await;
    assert_eq!(snapshot.phase, CallPhase::Idle);
    assert_eq!(snapshot.last_end, Some(EndReason::RemoteHangup));
    assert!(creator.media.all_stopped());
    assert!(joiner.media.all_stopped());
    assert_eq!(relay.get(&RelayPath::room(&room_id)), None);
    assert_eq!(relay.subscriber_count(), 0);
}
