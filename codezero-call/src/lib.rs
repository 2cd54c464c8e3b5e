pub mod config;
pub mod controller;
pub mod error;
pub mod media;
pub mod peer;
pub mod relay_client;

pub use config::CallConfig;
pub use controller::*;
pub use error::CallError;
pub use media::{LocalMedia, MediaConstraints, MediaDevices, MediaError, MediaTrack, TrackKind};
pub use peer::{
    NegotiationState, PeerConnector, PeerEvent, PeerLinkState, PeerSession, RemoteTrack,
};
pub use relay_client::WsRelayClient;
