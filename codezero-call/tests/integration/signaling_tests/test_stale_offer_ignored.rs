use codezero_call::{CallPhase, NegotiationState};
use codezero_core::relay::{MemoryRelay, RelayPath, RelayStore};
use serde_json::json;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::integration::signaling_tests::connected_pair;

#[tokio::test]
async fn test_stale_offer_ignored() {
    init_tracing();

    let relay = MemoryRelay::new();
    let (creator, joiner, room_id) = connected_pair(&relay).await;
    let joiner_peer = joiner.connector.last().unwrap();
    let creator_peer = creator.connector.last().unwrap();

    // A late offer lands after negotiation completed
    let outsider = relay.connect();
    outsider
        .write(
            &RelayPath::signaling(&room_id),
            json!({"type": "offer", "sdp": "late-offer"}),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(joiner_peer.negotiation(), NegotiationState::Stable);
    assert_eq!(creator_peer.negotiation(), NegotiationState::Stable);
    assert_eq!(joiner_peer.remote_sdp().as_deref(), Some("offer-from-creator"));
    assert_eq!(joiner.controller.snapshot().phase, CallPhase::Connected);
    assert_eq!(creator.controller.snapshot().phase, CallPhase::Connected);

    joiner.controller.end().await;
    creator.controller.end().await;
}
