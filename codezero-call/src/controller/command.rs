use crate::controller::StartOutcome;
use crate::error::CallError;
use codezero_core::RoomId;
use tokio::sync::oneshot;

/// Requests sent from [`CallController`](super::CallController) to its actor.
#[derive(Debug)]
pub enum CallCommand {
    /// Start a call (creating a room when `room` is `None`), or end the
    /// active one.
    StartOrJoin {
        room: Option<RoomId>,
        reply: oneshot::Sender<Result<StartOutcome, CallError>>,
    },

    ToggleCamera { reply: oneshot::Sender<Option<bool>> },

    ToggleMic { reply: oneshot::Sender<Option<bool>> },

    End { reply: oneshot::Sender<()> },
}
