mod synthetic;

pub use synthetic::{SyntheticMedia, SyntheticTrack};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("permission to use camera or microphone was denied")]
    PermissionDenied,
    #[error("no usable media device: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// A local capture track. Muting flips `enabled`; stopping is final.
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    fn enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);

    fn stop(&self);

    fn is_stopped(&self) -> bool;

    /// Track to attach to a webrtc-rs peer connection, if this backend has one.
    fn rtc_track(&self) -> Option<Arc<dyn TrackLocal + Send + Sync>> {
        None
    }
}

/// Capability for acquiring camera and microphone.
#[async_trait]
pub trait MediaDevices: Send + Sync + 'static {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalMedia, MediaError>;
}

/// The local media stream owned by one call.
#[derive(Clone)]
pub struct LocalMedia {
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    /// Whether tracks of `kind` exist and are enabled.
    pub fn is_enabled(&self, kind: TrackKind) -> bool {
        self.tracks
            .iter()
            .filter(|t| t.kind() == kind)
            .any(|t| t.enabled())
    }

    /// Flips every track of `kind`. Returns the new state, or `None` when the
    /// stream has no such track.
    pub fn toggle(&self, kind: TrackKind) -> Option<bool> {
        let enable = !self.is_enabled(kind);
        let mut touched = false;

        for track in self.tracks.iter().filter(|t| t.kind() == kind) {
            track.set_enabled(enable);
            touched = true;
        }
        touched.then_some(enable)
    }

    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tracks.iter().map(|t| (t.kind(), t.id().to_owned())))
            .finish()
    }
}
