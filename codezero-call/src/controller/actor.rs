use crate::controller::session::{CallSession, SessionEvent};
use crate::controller::{
    CallCommand, CallFailure, CallPhase, CallSnapshot, EndReason, StartOutcome,
};
use crate::error::CallError;
use crate::media::{LocalMedia, MediaConstraints, MediaDevices, MediaError, TrackKind};
use crate::peer::{NegotiationState, PeerConnector, PeerEvent};
use codezero_core::relay::{RelayError, RelayPath, RelayStore, Snapshot};
use codezero_core::utils::unix_millis;
use codezero_core::{CallIntent, CallRole, RoomId, SignalingMessage};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

type MediaResult = Result<LocalMedia, MediaError>;

/// A start request waiting for camera and microphone.
struct PendingStart {
    intent: CallIntent,
    media_rx: oneshot::Receiver<MediaResult>,
    reply: oneshot::Sender<Result<StartOutcome, CallError>>,
}

pub(crate) struct CallActor {
    relay: Arc<dyn RelayStore>,
    devices: Arc<dyn MediaDevices>,
    connector: Arc<dyn PeerConnector>,
    command_rx: mpsc::Receiver<CallCommand>,
    state_tx: watch::Sender<CallSnapshot>,
    pending: Option<PendingStart>,
    session: Option<CallSession>,
}

async fn next_media(
    pending: &mut Option<PendingStart>,
) -> Result<MediaResult, oneshot::error::RecvError> {
    match pending {
        Some(p) => (&mut p.media_rx).await,
        None => std::future::pending().await,
    }
}

async fn next_session_event(session: &mut Option<CallSession>) -> SessionEvent {
    match session {
        Some(s) => s.next_event().await,
        None => std::future::pending().await,
    }
}

impl CallActor {
    pub fn new(
        relay: Arc<dyn RelayStore>,
        devices: Arc<dyn MediaDevices>,
        connector: Arc<dyn PeerConnector>,
        command_rx: mpsc::Receiver<CallCommand>,
        state_tx: watch::Sender<CallSnapshot>,
    ) -> Self {
        Self {
            relay,
            devices,
            connector,
            command_rx,
            state_tx,
            pending: None,
            session: None,
        }
    }

    pub async fn run(mut self) {
        info!("Call controller started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Controller handle dropped. Shutting down.");
                            break;
                        }
                    }
                }

                res = next_media(&mut self.pending) => self.on_media(res).await,

                evt = next_session_event(&mut self.session) => self.handle_session_event(evt).await,
            }
        }

        self.end(EndReason::Shutdown).await;
        info!("Call controller finished");
    }

    fn publish(&self, f: impl FnOnce(&mut CallSnapshot)) {
        self.state_tx.send_modify(f);
    }

    async fn handle_command(&mut self, cmd: CallCommand) {
        match cmd {
            CallCommand::StartOrJoin { room, reply } => {
                if self.pending.is_some() || self.session.is_some() {
                    self.end(EndReason::Local).await;
                    let _ = reply.send(Ok(StartOutcome::Ended));
                    return;
                }
                self.begin_acquisition(CallIntent::from(room), reply);
            }

            CallCommand::ToggleCamera { reply } => {
                let _ = reply.send(self.toggle(TrackKind::Video));
            }

            CallCommand::ToggleMic { reply } => {
                let _ = reply.send(self.toggle(TrackKind::Audio));
            }

            CallCommand::End { reply } => {
                self.end(EndReason::Local).await;
                let _ = reply.send(());
            }
        }
    }

    fn begin_acquisition(
        &mut self,
        intent: CallIntent,
        reply: oneshot::Sender<Result<StartOutcome, CallError>>,
    ) {
        info!("Requesting camera and microphone");
        self.publish(|s| {
            s.phase = CallPhase::AcquiringMedia;
            s.last_failure = None;
            s.last_end = None;
        });

        let (media_tx, media_rx) = oneshot::channel();
        let devices = self.devices.clone();
        tokio::spawn(async move {
            let res = devices.acquire(MediaConstraints::default()).await;
            // The call was ended while we waited; nobody owns these tracks.
            if let Err(Ok(media)) = media_tx.send(res) {
                debug!("Acquisition outlived its call, stopping tracks");
                media.stop_all();
            }
        });

        self.pending = Some(PendingStart {
            intent,
            media_rx,
            reply,
        });
    }

    fn toggle(&self, kind: TrackKind) -> Option<bool> {
        let session = self.session.as_ref()?;
        let enabled = session.media.toggle(kind)?;

        debug!("Local {} enabled: {}", kind, enabled);
        self.publish(|s| match kind {
            TrackKind::Video => s.camera_enabled = enabled,
            TrackKind::Audio => s.mic_enabled = enabled,
        });
        Some(enabled)
    }

    async fn on_media(&mut self, res: Result<MediaResult, oneshot::error::RecvError>) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let outcome = match res {
            Ok(Ok(media)) => self.start_session(pending.intent, media).await,
            Ok(Err(e)) => {
                warn!("Media acquisition failed: {}", e);
                let failure = match e {
                    MediaError::PermissionDenied => CallFailure::PermissionDenied,
                    MediaError::Unavailable(_) => CallFailure::MediaUnavailable,
                };
                self.fail(failure).await;
                Err(CallError::from(e))
            }
            Err(_) => {
                warn!("Media acquisition task vanished");
                self.fail(CallFailure::MediaUnavailable).await;
                Err(CallError::MediaUnavailable("acquisition aborted".to_owned()))
            }
        };

        let _ = pending.reply.send(outcome);
    }

    async fn start_session(
        &mut self,
        intent: CallIntent,
        media: LocalMedia,
    ) -> Result<StartOutcome, CallError> {
        let (room_id, role) = intent.resolve();
        info!("Starting call in room {} as {:?}", room_id, role);

        self.publish(|s| {
            s.phase = CallPhase::Negotiating;
            s.room_id = Some(room_id.clone());
            s.role = Some(role);
            s.camera_enabled = media.is_enabled(TrackKind::Video);
            s.mic_enabled = media.is_enabled(TrackKind::Audio);
            s.remote_tracks.clear();
            s.peer_link = None;
        });

        let (events_tx, events_rx) = mpsc::channel(256);
        let peer = match self.connector.connect(&media, events_tx).await {
            Ok(peer) => peer,
            Err(e) => {
                media.stop_all();
                let err = CallError::negotiation(e);
                warn!("Failed to create peer connection: {}", err);
                self.fail(CallFailure::Negotiation).await;
                return Err(err);
            }
        };

        let subscriptions = async {
            let signaling = self.relay.subscribe(&RelayPath::signaling(&room_id)).await?;
            let candidates = self.relay.subscribe(&RelayPath::candidates(&room_id)).await?;
            Ok::<_, CallError>((signaling, candidates))
        };
        let (signaling, candidates) = match subscriptions.await {
            Ok(subs) => subs,
            Err(e) => {
                warn!("Failed to subscribe to room {}: {}", room_id, e);
                media.stop_all();
                if let Err(e) = peer.close().await {
                    warn!("Failed to close peer connection: {:#}", e);
                }
                self.fail(CallFailure::Relay).await;
                return Err(e);
            }
        };

        self.session = Some(CallSession::new(
            room_id.clone(),
            role,
            media,
            peer,
            events_rx,
            signaling,
            candidates,
        ));

        if role == CallRole::Creator {
            if let Err((failure, e)) = self.open_room(&room_id).await {
                warn!("Failed to open room {}: {}", room_id, e);
                self.fail(failure).await;
                return Err(e);
            }
        }

        Ok(StartOutcome::Started { room_id, role })
    }

    /// Creator side: room marker, disconnect cleanup, then the offer.
    async fn open_room(&mut self, room_id: &RoomId) -> Result<(), (CallFailure, CallError)> {
        let relay_err = |e: RelayError| (CallFailure::Relay, CallError::from(e));
        let room = RelayPath::room(room_id);

        self.relay
            .write(&room, json!({ "createdAt": unix_millis() }))
            .await
            .map_err(relay_err)?;
        self.relay
            .remove_on_disconnect(&room)
            .await
            .map_err(relay_err)?;

        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let sdp = session
            .peer
            .create_offer()
            .await
            .map_err(|e| (CallFailure::Negotiation, CallError::negotiation(e)))?;

        let offer = serde_json::to_value(SignalingMessage::Offer { sdp })
            .map_err(|e| relay_err(e.into()))?;
        self.relay
            .write(&RelayPath::signaling(room_id), offer)
            .await
            .map_err(relay_err)?;

        info!("Offer published to room {}", room_id);
        Ok(())
    }

    async fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Signaling(snapshot) => self.on_signaling(snapshot).await,

            SessionEvent::Candidates(snapshot) => {
                if let Some(session) = self.session.as_mut() {
                    session.ingest_candidates(snapshot).await;
                }
            }

            SessionEvent::Peer(event) => self.on_peer_event(event).await,

            SessionEvent::PeerClosed => debug!("Peer event channel closed"),

            SessionEvent::RelayLost => {
                warn!("Relay subscription ended unexpectedly");
                self.end(EndReason::RelayLost).await;
            }
        }
    }

    async fn on_peer_event(&mut self, event: PeerEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match event {
            PeerEvent::LocalCandidate(candidate) => {
                session.emit_candidate(self.relay.as_ref(), candidate).await;
            }

            PeerEvent::RemoteTrack(track) => {
                info!("Remote {} track {} received", track.kind, track.id);
                self.publish(|s| {
                    if !s.remote_tracks.iter().any(|t| t.id == track.id) {
                        s.remote_tracks.push(track);
                    }
                });
            }

            PeerEvent::LinkState(state) => {
                debug!("Peer link is now {:?}", state);
                self.publish(|s| s.peer_link = Some(state));
            }
        }
    }

    async fn on_signaling(&mut self, snapshot: Snapshot) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let Some(value) = snapshot else {
            if session.signaling_seen {
                info!("Signaling for room {} removed, remote hung up", session.room_id);
                self.end(EndReason::RemoteHangup).await;
            }
            return;
        };
        session.signaling_seen = true;

        let message = match serde_json::from_value::<SignalingMessage>(value) {
            Ok(m) => m,
            Err(e) => {
                warn!("Ignoring malformed signaling message: {}", e);
                return;
            }
        };

        let state = session.peer.negotiation_state().await;
        let applied = match (&message, session.role) {
            (SignalingMessage::Offer { .. }, CallRole::Joiner) if state.accepts_offer() => {
                self.answer_offer(&message).await
            }
            (SignalingMessage::Answer { .. }, CallRole::Creator)
                if state == NegotiationState::HaveLocalOffer =>
            {
                self.accept_answer(&message).await
            }
            _ => {
                debug!("Ignoring stale {} in state {:?}", message.kind(), state);
                return;
            }
        };

        match applied {
            Ok(()) => {
                self.publish(|s| s.phase = CallPhase::Connected);
                if let Some(session) = self.session.as_mut() {
                    session.flush_deferred().await;
                }
            }
            Err(e) => warn!("Failed to apply {}: {}", message.kind(), e),
        }
    }

    async fn answer_offer(&mut self, offer: &SignalingMessage) -> Result<(), CallError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };

        session
            .peer
            .set_remote_description(offer)
            .await
            .map_err(CallError::negotiation)?;
        let sdp = session
            .peer
            .create_answer()
            .await
            .map_err(CallError::negotiation)?;

        let answer = serde_json::to_value(SignalingMessage::Answer { sdp })
            .map_err(|e| CallError::Relay(e.into()))?;
        self.relay
            .write(&RelayPath::signaling(&session.room_id), answer)
            .await?;

        info!("Answer published to room {}", session.room_id);
        Ok(())
    }

    async fn accept_answer(&mut self, answer: &SignalingMessage) -> Result<(), CallError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };

        session
            .peer
            .set_remote_description(answer)
            .await
            .map_err(CallError::negotiation)?;

        info!("Answer applied for room {}", session.room_id);
        Ok(())
    }

    /// Drops whatever the current call holds. Returns false when there was
    /// nothing to release.
    async fn release(&mut self) -> bool {
        let pending = self.pending.take();
        let session = self.session.take();
        if pending.is_none() && session.is_none() {
            return false;
        }

        self.publish(|s| s.phase = CallPhase::Ending);

        if let Some(pending) = pending {
            debug!("Cancelling start that was still acquiring media");
            let _ = pending.reply.send(Err(CallError::Cancelled));
        }
        if let Some(session) = session {
            session.close(self.relay.as_ref()).await;
        }
        true
    }

    async fn end(&mut self, reason: EndReason) {
        if !self.release().await {
            return;
        }

        info!("Call ended: {:?}", reason);
        self.publish(|s| {
            *s = CallSnapshot {
                last_failure: s.last_failure,
                last_end: Some(reason),
                ..Default::default()
            }
        });
    }

    async fn fail(&mut self, failure: CallFailure) {
        self.release().await;

        self.publish(|s| {
            s.phase = CallPhase::Failed(failure);
            s.last_failure = Some(failure);
        });
        self.publish(|s| {
            *s = CallSnapshot {
                last_failure: Some(failure),
                last_end: Some(EndReason::Failed),
                ..Default::default()
            }
        });
    }
}
