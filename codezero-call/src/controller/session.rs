use crate::media::LocalMedia;
use crate::peer::{NegotiationState, PeerEvent, PeerSession};
use codezero_core::relay::{RelayPath, RelayStore, Snapshot, Subscription};
use codezero_core::{CallRole, CandidateKey, CandidateKeyGen, IceCandidate, RoomId};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Upper bound on waiting for the relay to drop the room during teardown.
const ROOM_REMOVAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything one call owns between start and teardown.
pub(crate) struct CallSession {
    pub room_id: RoomId,
    pub role: CallRole,
    pub media: LocalMedia,
    pub peer: Box<dyn PeerSession>,
    peer_events: mpsc::Receiver<PeerEvent>,
    peer_events_open: bool,
    signaling: Subscription,
    candidates: Subscription,
    /// Candidate keys already applied, plus every key this peer wrote itself.
    consumed: HashSet<CandidateKey>,
    keys: CandidateKeyGen,
    /// Whether the signaling slot has held a value during this call.
    pub signaling_seen: bool,
    /// Latest candidate collection that arrived before a remote description.
    deferred_candidates: Option<Value>,
}

pub(crate) enum SessionEvent {
    Signaling(Snapshot),
    Candidates(Snapshot),
    Peer(PeerEvent),
    PeerClosed,
    RelayLost,
}

impl CallSession {
    pub fn new(
        room_id: RoomId,
        role: CallRole,
        media: LocalMedia,
        peer: Box<dyn PeerSession>,
        peer_events: mpsc::Receiver<PeerEvent>,
        signaling: Subscription,
        candidates: Subscription,
    ) -> Self {
        Self {
            room_id,
            role,
            media,
            peer,
            peer_events,
            peer_events_open: true,
            signaling,
            candidates,
            consumed: HashSet::new(),
            keys: CandidateKeyGen::new(role),
            signaling_seen: false,
            deferred_candidates: None,
        }
    }

    pub async fn next_event(&mut self) -> SessionEvent {
        tokio::select! {
            s = self.signaling.next() => match s {
                Some(s) => SessionEvent::Signaling(s),
                None => SessionEvent::RelayLost,
            },
            s = self.candidates.next() => match s {
                Some(s) => SessionEvent::Candidates(s),
                None => SessionEvent::RelayLost,
            },
            e = self.peer_events.recv(), if self.peer_events_open => match e {
                Some(e) => SessionEvent::Peer(e),
                None => {
                    self.peer_events_open = false;
                    SessionEvent::PeerClosed
                }
            },
        }
    }

    /// Publishes a locally gathered candidate under a fresh key.
    pub async fn emit_candidate(&mut self, relay: &dyn RelayStore, candidate: IceCandidate) {
        let key = self.keys.next_key();
        self.consumed.insert(key.clone());

        let value = match serde_json::to_value(&candidate) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to encode local candidate: {}", e);
                return;
            }
        };
        let path = RelayPath::candidate(&self.room_id, &key);
        if let Err(e) = relay.write(&path, value).await {
            warn!("Failed to publish candidate {}: {}", key, e);
        }
    }

    /// Applies every candidate in `snapshot` that was not applied before.
    pub async fn ingest_candidates(&mut self, snapshot: Snapshot) {
        let Some(collection) = snapshot else {
            return;
        };

        if !self.peer.negotiation_state().await.has_remote_description() {
            debug!("No remote description yet, deferring candidates");
            self.deferred_candidates = Some(collection);
            return;
        }

        let Value::Object(map) = collection else {
            warn!("Candidate collection is not an object, ignoring");
            return;
        };

        let mut entries: Vec<(String, Value)> = map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (raw_key, value) in entries {
            let key = match CandidateKey::try_from(raw_key) {
                Ok(k) => k,
                Err(e) => {
                    warn!("Skipping candidate with bad key: {}", e);
                    continue;
                }
            };
            if self.consumed.contains(&key) {
                continue;
            }

            match serde_json::from_value::<IceCandidate>(value) {
                Ok(candidate) => {
                    if let Err(e) = self.peer.add_ice_candidate(candidate).await {
                        warn!("Failed to apply candidate {}: {:#}", key, e);
                    }
                }
                Err(e) => warn!("Malformed candidate {}: {}", key, e),
            }
            self.consumed.insert(key);
        }
    }

    /// Re-runs ingestion for candidates that arrived too early.
    pub async fn flush_deferred(&mut self) {
        if let Some(collection) = self.deferred_candidates.take() {
            self.ingest_candidates(Some(collection)).await;
        }
    }

    /// Releases the call: subscriptions first, then tracks, the negotiation
    /// object and finally the room entry. Room removal is best-effort and
    /// bounded by [`ROOM_REMOVAL_TIMEOUT`].
    pub async fn close(self, relay: &dyn RelayStore) {
        let CallSession {
            room_id,
            media,
            peer,
            peer_events,
            signaling,
            candidates,
            ..
        } = self;

        drop(signaling);
        drop(candidates);
        drop(peer_events);

        media.stop_all();

        if peer.negotiation_state().await != NegotiationState::Closed {
            if let Err(e) = peer.close().await {
                warn!("Failed to close peer connection: {:#}", e);
            }
        }

        match timeout(ROOM_REMOVAL_TIMEOUT, relay.remove(&RelayPath::room(&room_id))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to remove room {}: {}", room_id, e),
            Err(_) => warn!(
                "Relay did not confirm removal of room {} within {:?}",
                room_id, ROOM_REMOVAL_TIMEOUT
            ),
        }
        info!("Call in room {} released", room_id);
    }
}
