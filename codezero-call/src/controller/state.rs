use crate::peer::{PeerLinkState, RemoteTrack};
use codezero_core::{CallRole, RoomId};
use crate::media::TrackKind;

/// Why a call failed. Published through [`CallPhase::Failed`] and kept in
/// [`CallSnapshot::last_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFailure {
    PermissionDenied,
    MediaUnavailable,
    Negotiation,
    Relay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallPhase {
    #[default]
    Idle,
    AcquiringMedia,
    Negotiating,
    Connected,
    Ending,
    /// Transient: immediately followed by `Idle`.
    Failed(CallFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The local user hung up.
    Local,
    /// The signaling slot vanished while the call was active.
    RemoteHangup,
    /// A relay subscription stopped delivering.
    RelayLost,
    Failed,
    /// The controller itself went away.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { room_id: RoomId, role: CallRole },
    /// The call that was active has been ended instead.
    Ended,
}

/// Observable state of the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallSnapshot {
    pub phase: CallPhase,
    pub room_id: Option<RoomId>,
    pub role: Option<CallRole>,
    pub camera_enabled: bool,
    pub mic_enabled: bool,
    pub remote_tracks: Vec<RemoteTrack>,
    pub peer_link: Option<PeerLinkState>,
    pub last_failure: Option<CallFailure>,
    pub last_end: Option<EndReason>,
}

impl CallSnapshot {
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, CallPhase::Idle | CallPhase::Failed(_))
    }

    pub fn remote_video(&self) -> Option<&RemoteTrack> {
        self.remote_tracks
            .iter()
            .find(|t| t.kind == TrackKind::Video)
    }
}
