pub mod signaling_tests;

use codezero_call::{CallController, CallPhase, CallSnapshot};
use codezero_core::relay::{MemoryRelay, RelayConnection};
use std::sync::Arc;
use tracing::Level;

use crate::utils::{FakeConnector, FakeMedia, wait_for_snapshot};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One participant wired to an in-memory relay with fake media and peers.
pub struct TestPeer {
    pub controller: Arc<CallController>,
    pub media: FakeMedia,
    pub connector: FakeConnector,
    pub relay: Arc<RelayConnection>,
}

pub fn create_test_peer(relay: &MemoryRelay, label: &str, media: FakeMedia) -> TestPeer {
    let conn = Arc::new(relay.connect());
    let connector = FakeConnector::new(label);

    let controller = CallController::spawn(
        conn.clone(),
        Arc::new(media.clone()),
        Arc::new(connector.clone()),
    );

    TestPeer {
        controller: Arc::new(controller),
        media,
        connector,
        relay: conn,
    }
}

pub async fn wait_connected(peer: &TestPeer) -> CallSnapshot {
    wait_for_snapshot(&peer.controller, |s| {
        s.phase == CallPhase::Connected && s.remote_video().is_some()
    })
    .await
}

pub async fn wait_idle(peer: &TestPeer) -> CallSnapshot {
    wait_for_snapshot(&peer.controller, |s| s.phase == CallPhase::Idle).await
}
