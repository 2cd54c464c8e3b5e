use codezero_call::{CallPhase, NegotiationState};
use codezero_core::relay::{MemoryRelay, RelayPath, RelayStore};
use serde_json::json;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::integration::signaling_tests::connected_pair;

#[tokio::test]
async fn test_stale_answer_ignored() {
    init_tracing();

    let relay = MemoryRelay::new();
    let (creator, joiner, room_id) = connected_pair(&relay).await;
    let creator_peer = creator.connector.last().unwrap();
    assert_eq!(creator_peer.remote_sdp().as_deref(), Some("answer-from-joiner"));

    // A second answer shows up once the creator is already stable
    let outsider = relay.connect();
    outsider
        .write(
            &RelayPath::signaling(&room_id),
            json!({"type": "answer", "sdp": "late-answer"}),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(creator_peer.negotiation(), NegotiationState::Stable);
    assert_eq!(creator_peer.remote_sdp().as_deref(), Some("answer-from-joiner"));
    assert_eq!(creator.controller.snapshot().phase, CallPhase::Connected);
    assert_eq!(joiner.controller.snapshot().phase, CallPhase::Connected);

    joiner.controller.end().await;
    creator.controller.end().await;
}
