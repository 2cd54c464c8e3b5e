//! Call lifecycle for one participant: media, negotiation and relay traffic,
//! serialised through a single actor task.

mod actor;
mod command;
mod session;
mod state;

pub use command::CallCommand;
pub use state::{CallFailure, CallPhase, CallSnapshot, EndReason, StartOutcome};

use crate::error::CallError;
use crate::media::MediaDevices;
use crate::peer::PeerConnector;
use actor::CallActor;
use codezero_core::RoomId;
use codezero_core::relay::RelayStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::warn;

/// Handle to a running call controller.
///
/// Dropping the handle ends any active call and stops the controller task;
/// [`CallController::shutdown`] does the same and waits for it.
pub struct CallController {
    command_tx: mpsc::Sender<CallCommand>,
    state_rx: watch::Receiver<CallSnapshot>,
    task: JoinHandle<()>,
}

impl CallController {
    pub fn spawn(
        relay: Arc<dyn RelayStore>,
        devices: Arc<dyn MediaDevices>,
        connector: Arc<dyn PeerConnector>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(100);
        let (state_tx, state_rx) = watch::channel(CallSnapshot::default());

        let actor = CallActor::new(relay, devices, connector, command_rx, state_tx);
        let task = tokio::spawn(actor.run());

        Self {
            command_tx,
            state_rx,
            task,
        }
    }

    /// Starts a call, joining `room` when given and creating a room otherwise.
    /// While a call is active this ends it instead.
    pub async fn start_or_join(&self, room: Option<RoomId>) -> Result<StartOutcome, CallError> {
        let (reply, rx) = oneshot::channel();
        self.send(CallCommand::StartOrJoin { room, reply }).await?;
        rx.await.map_err(|_| CallError::ControllerGone)?
    }

    /// Flips the camera. `None` when there is no local stream.
    pub async fn toggle_camera(&self) -> Option<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(CallCommand::ToggleCamera { reply }).await.ok()?;
        rx.await.ok().flatten()
    }

    /// Flips the microphone. `None` when there is no local stream.
    pub async fn toggle_mic(&self) -> Option<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(CallCommand::ToggleMic { reply }).await.ok()?;
        rx.await.ok().flatten()
    }

    /// Ends the current call, if any. Safe to call in any phase.
    pub async fn end(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send(CallCommand::End { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<CallSnapshot> {
        self.state_rx.clone()
    }

    /// Ends any active call and waits for the controller task to finish.
    pub async fn shutdown(self) {
        let CallController {
            command_tx, task, ..
        } = self;
        drop(command_tx);

        if let Err(e) = task.await {
            warn!("Call controller task failed: {}", e);
        }
    }

    async fn send(&self, cmd: CallCommand) -> Result<(), CallError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| CallError::ControllerGone)
    }
}
