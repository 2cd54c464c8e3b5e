use async_trait::async_trait;
use codezero_call::{LocalMedia, MediaConstraints, MediaDevices, MediaError, MediaTrack, TrackKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Capture track that only records its flags.
pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl FakeTrack {
    fn new(id: String, kind: TrackKind) -> Self {
        Self {
            id,
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

struct FakeMediaInner {
    deny: bool,
    /// When set, acquisition blocks until the gate is notified.
    gate: Option<Arc<Notify>>,
    issued: Mutex<Vec<Arc<FakeTrack>>>,
}

/// Media devices that hand out [`FakeTrack`]s and remember every one of them.
#[derive(Clone)]
pub struct FakeMedia {
    inner: Arc<FakeMediaInner>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::build(false, None)
    }

    /// Devices whose permission prompt is always declined.
    pub fn denying() -> Self {
        Self::build(true, None)
    }

    /// Devices that wait for the returned gate before answering.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (Self::build(false, Some(gate.clone())), gate)
    }

    fn build(deny: bool, gate: Option<Arc<Notify>>) -> Self {
        Self {
            inner: Arc::new(FakeMediaInner {
                deny,
                gate,
                issued: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn issued(&self) -> Vec<Arc<FakeTrack>> {
        self.inner.issued.lock().unwrap().clone()
    }

    pub fn all_stopped(&self) -> bool {
        self.issued().iter().all(|t| t.is_stopped())
    }
}

#[async_trait]
impl MediaDevices for FakeMedia {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalMedia, MediaError> {
        if let Some(gate) = &self.inner.gate {
            gate.notified().await;
        }
        if self.inner.deny {
            return Err(MediaError::PermissionDenied);
        }

        let mut issued = self.inner.issued.lock().unwrap();
        let mut tracks: Vec<Arc<dyn MediaTrack>> = Vec::new();
        let n = issued.len();

        if constraints.audio {
            let track = Arc::new(FakeTrack::new(format!("audio-{}", n), TrackKind::Audio));
            issued.push(track.clone());
            tracks.push(track);
        }
        if constraints.video {
            let track = Arc::new(FakeTrack::new(format!("video-{}", n), TrackKind::Video));
            issued.push(track.clone());
            tracks.push(track);
        }
        Ok(LocalMedia::new(tracks))
    }
}
