use codezero_core::relay::{MemoryRelay, RelayPath, RelayStore};
use codezero_core::{CandidateKey, IceCandidate};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::integration::signaling_tests::connected_pair;
use crate::utils::eventually;

#[tokio::test]
async fn test_candidate_redelivery_is_idempotent() {
    init_tracing();

    let relay = MemoryRelay::new();
    let (creator, joiner, room_id) = connected_pair(&relay).await;
    let creator_peer = creator.connector.last().unwrap();

    eventually(|| !creator_peer.applied().is_empty()).await;
    let before = creator_peer.applied().len();

    // A third party appends one good and one malformed record; every write
    // redelivers the whole collection to both peers.
    let outsider = relay.connect();
    let good = CandidateKey::try_from("9999999999999-j9999".to_owned()).unwrap();
    let bad = CandidateKey::try_from("9999999999999-j9998".to_owned()).unwrap();
    let extra = IceCandidate {
        candidate: "candidate:joiner-extra 1 udp 1 10.0.0.9 5000 typ host".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    };

    outsider
        .write(&RelayPath::candidate(&room_id, &bad), json!("garbage"))
        .await
        .unwrap();
    outsider
        .write(
            &RelayPath::candidate(&room_id, &good),
            serde_json::to_value(&extra).unwrap(),
        )
        .await
        .unwrap();

    eventually(|| creator_peer.applied().len() == before + 1).await;

    // Give any duplicate deliveries a chance to show up
    tokio::time::sleep(Duration::from_millis(100)).await;

    let applied = creator_peer.applied();
    assert_eq!(applied.len(), before + 1);
    let unique: HashSet<&str> = applied.iter().map(|c| c.candidate.as_str()).collect();
    assert_eq!(unique.len(), applied.len());
    assert!(unique.contains(extra.candidate.as_str()));

    joiner.controller.end().await;
    creator.controller.end().await;
}
