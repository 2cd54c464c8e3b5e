mod rtc;

pub use rtc::{RtcPeerConnector, RtcPeerSession};

use crate::media::{LocalMedia, TrackKind};
use anyhow::Result;
use async_trait::async_trait;
use codezero_core::{IceCandidate, SignalingMessage};
use tokio::sync::mpsc;

/// Where the negotiation object is in the offer/answer exchange.
///
/// `New` is a fresh object with no descriptions applied; `Stable` means
/// both descriptions are in place and negotiation has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Closed,
}

impl NegotiationState {
    /// Whether a remote offer may be applied in this state.
    pub fn accepts_offer(self) -> bool {
        matches!(self, Self::New | Self::HaveRemoteOffer)
    }

    /// Remote candidates can only be applied once a remote description is set.
    pub fn has_remote_description(self) -> bool {
        matches!(self, Self::HaveRemoteOffer | Self::Stable)
    }
}

/// Connectivity of the underlying transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerLinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
    pub stream_id: String,
}

/// Events the negotiation object raises for the controller.
#[derive(Debug)]
pub enum PeerEvent {
    LocalCandidate(IceCandidate),
    RemoteTrack(RemoteTrack),
    LinkState(PeerLinkState),
}

/// Peer negotiation object for one call.
#[async_trait]
pub trait PeerSession: Send + Sync {
    async fn negotiation_state(&self) -> NegotiationState;

    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<String>;

    /// Creates an answer and installs it as the local description.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, desc: &SignalingMessage) -> Result<()>;

    /// Applies a remote candidate. A no-op once the session is closed.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds negotiation objects with the local tracks attached.
#[async_trait]
pub trait PeerConnector: Send + Sync + 'static {
    async fn connect(
        &self,
        media: &LocalMedia,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Box<dyn PeerSession>>;
}
