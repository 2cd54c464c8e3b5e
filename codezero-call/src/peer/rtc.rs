use crate::config::CallConfig;
use crate::media::{LocalMedia, TrackKind};
use crate::peer::{
    NegotiationState, PeerConnector, PeerEvent, PeerLinkState, PeerSession, RemoteTrack,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use codezero_core::{IceCandidate, IceServerConfig, SignalingMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// webrtc-rs peer connection driven by the call controller.
pub struct RtcPeerSession {
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl RtcPeerSession {
    /// Builds the connection and wires its callbacks into `event_tx`.
    pub async fn new(
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<PeerEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|s| RTCIceServer {
                    urls: s.urls.clone(),
                    username: s.username.clone().unwrap_or_default(),
                    credential: s.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let _ = tx.send(PeerEvent::LinkState(link_state(s))).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx.send(PeerEvent::LocalCandidate(candidate)).await;
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    other => {
                        warn!("Ignoring remote track of kind {:?}", other);
                        return;
                    }
                };
                let remote = RemoteTrack {
                    id: track.id(),
                    kind,
                    stream_id: track.stream_id(),
                };
                debug!("Remote {} track {} arrived", remote.kind, remote.id);
                let _ = tx.send(PeerEvent::RemoteTrack(remote)).await;

                // Drain RTP so the receive buffers never fill up.
                tokio::spawn(async move { while track.read_rtp().await.is_ok() {} });
            })
        }));

        Ok(Self { peer_connection })
    }

    fn is_closed(&self) -> bool {
        self.peer_connection.connection_state() == RTCPeerConnectionState::Closed
            || self.peer_connection.signaling_state() == RTCSignalingState::Closed
    }
}

fn link_state(s: RTCPeerConnectionState) -> PeerLinkState {
    match s {
        RTCPeerConnectionState::Connecting => PeerLinkState::Connecting,
        RTCPeerConnectionState::Connected => PeerLinkState::Connected,
        RTCPeerConnectionState::Disconnected => PeerLinkState::Disconnected,
        RTCPeerConnectionState::Failed => PeerLinkState::Failed,
        RTCPeerConnectionState::Closed => PeerLinkState::Closed,
        _ => PeerLinkState::New,
    }
}

#[async_trait]
impl PeerSession for RtcPeerSession {
    async fn negotiation_state(&self) -> NegotiationState {
        if self.is_closed() {
            return NegotiationState::Closed;
        }
        match self.peer_connection.signaling_state() {
            RTCSignalingState::HaveLocalOffer | RTCSignalingState::HaveLocalPranswer => {
                NegotiationState::HaveLocalOffer
            }
            RTCSignalingState::HaveRemoteOffer | RTCSignalingState::HaveRemotePranswer => {
                NegotiationState::HaveRemoteOffer
            }
            RTCSignalingState::Stable => {
                if self.peer_connection.remote_description().await.is_some() {
                    NegotiationState::Stable
                } else {
                    NegotiationState::New
                }
            }
            _ => NegotiationState::New,
        }
    }

    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(&self, desc: &SignalingMessage) -> Result<()> {
        let desc = match desc {
            SignalingMessage::Offer { sdp } => RTCSessionDescription::offer(sdp.clone())?,
            SignalingMessage::Answer { sdp } => RTCSessionDescription::answer(sdp.clone())?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        if self.is_closed() {
            debug!("Connection closed, skipping candidate");
            return Ok(());
        }
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates [`RtcPeerSession`]s with the configured ICE servers.
#[derive(Debug, Clone)]
pub struct RtcPeerConnector {
    ice_servers: Vec<IceServerConfig>,
}

impl RtcPeerConnector {
    pub fn new(config: &CallConfig) -> Self {
        Self {
            ice_servers: config.ice_servers.clone(),
        }
    }

    pub fn with_ice_servers(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl PeerConnector for RtcPeerConnector {
    async fn connect(
        &self,
        media: &LocalMedia,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Box<dyn PeerSession>> {
        let session = RtcPeerSession::new(&self.ice_servers, events).await?;

        for track in media.tracks() {
            let Some(rtc_track) = track.rtc_track() else {
                warn!("Local {} track {} has no RTC backing", track.kind(), track.id());
                continue;
            };
            let sender = session
                .peer_connection
                .add_track(rtc_track)
                .await
                .context("Failed to attach local track")?;

            // RTCP has to be read for interceptors like NACK to work.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }

        Ok(Box::new(session))
    }
}
