use codezero_call::{CallController, CallSnapshot};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

/// Waits until the controller publishes a snapshot matching `pred`.
pub async fn wait_for_snapshot(
    controller: &CallController,
    pred: impl FnMut(&CallSnapshot) -> bool,
) -> CallSnapshot {
    let mut rx = controller.watch();
    let snapshot = tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("Timed out waiting for call state")
        .expect("Controller went away");
    snapshot.clone()
}

/// Polls `cond` until it holds.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Condition not met in time");
}
