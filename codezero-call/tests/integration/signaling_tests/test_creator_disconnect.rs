use codezero_call::{CallPhase, EndReason};
use codezero_core::relay::{MemoryRelay, RelayPath};

use crate::integration::signaling_tests::connected_pair;
use crate::integration::{init_tracing, wait_idle};

#[tokio::test]
async fn test_creator_disconnect_removes_room() {
    init_tracing();

    let relay = MemoryRelay::new();
    let (creator, joiner, room_id) = connected_pair(&relay).await;

    // The creator's tab dies without hanging up
    creator.relay.disconnect();

    assert_eq!(relay.get(&RelayPath::room(&room_id)), None);

    let joiner_view = wait_idle(&joiner).await;
    assert_eq!(joiner_view.last_end, Some(EndReason::RemoteHangup));

    let creator_view = wait_idle(&creator).await;
    assert_eq!(creator_view.phase, CallPhase::Idle);
    assert_eq!(creator_view.last_end, Some(EndReason::RelayLost));
    assert!(creator.media.all_stopped());
}
