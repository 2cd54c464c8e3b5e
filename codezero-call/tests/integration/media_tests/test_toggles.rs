use codezero_call::{MediaTrack, StartOutcome, TrackKind};
use codezero_core::relay::MemoryRelay;

use crate::integration::{create_test_peer, init_tracing};
use crate::utils::FakeMedia;

#[tokio::test]
async fn test_toggles_without_stream_are_noops() {
    init_tracing();

    let relay = MemoryRelay::new();
    let peer = create_test_peer(&relay, "idle", FakeMedia::new());

    assert_eq!(peer.controller.toggle_camera().await, None);
    assert_eq!(peer.controller.toggle_mic().await, None);

    let snapshot = peer.controller.snapshot();
    assert!(!snapshot.camera_enabled);
    assert!(!snapshot.mic_enabled);
    assert!(peer.media.issued().is_empty());
}

#[tokio::test]
async fn test_toggles_flip_track_flags() {
    init_tracing();

    let relay = MemoryRelay::new();
    let peer = create_test_peer(&relay, "creator", FakeMedia::new());

    let outcome = peer.controller.start_or_join(None).await.unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));
    assert!(peer.controller.snapshot().camera_enabled);

    assert_eq!(peer.controller.toggle_camera().await, Some(false));
    let snapshot = peer.controller.snapshot();
    assert!(!snapshot.camera_enabled);
    assert!(snapshot.mic_enabled);

    let video_off = peer
        .media
        .issued()
        .iter()
        .filter(|t| t.kind() == TrackKind::Video)
        .all(|t| !t.enabled());
    assert!(video_off);

    assert_eq!(peer.controller.toggle_mic().await, Some(false));
    assert_eq!(peer.controller.toggle_camera().await, Some(true));
    assert!(peer.controller.snapshot().camera_enabled);
    assert!(!peer.controller.snapshot().mic_enabled);

    // Toggles stop working once the call is over
    peer.controller.end().await;
    assert_eq!(peer.controller.toggle_camera().await, None);
}
