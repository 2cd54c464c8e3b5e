mod test_candidate_redelivery;
mod test_creator_disconnect;
mod test_remote_hangup;
mod test_stale_answer_ignored;
mod test_stale_offer_ignored;

use codezero_core::RoomId;
use codezero_core::relay::MemoryRelay;

use crate::integration::{TestPeer, create_test_peer, wait_connected};
use crate::utils::FakeMedia;
use codezero_call::StartOutcome;

/// Brings up a creator and a joiner in the same room and waits until both
/// consider the call connected.
pub async fn connected_pair(relay: &MemoryRelay) -> (TestPeer, TestPeer, RoomId) {
    let creator = create_test_peer(relay, "creator", FakeMedia::new());
    let joiner = create_test_peer(relay, "joiner", FakeMedia::new());

    let StartOutcome::Started { room_id, .. } =
        creator.controller.start_or_join(None).await.unwrap()
    else {
        panic!("Creator did not start");
    };
    joiner
        .controller
        .start_or_join(Some(room_id.clone()))
        .await
        .unwrap();

    wait_connected(&creator).await;
    wait_connected(&joiner).await;

    (creator, joiner, room_id)
}
