use crate::media::{LocalMedia, MediaConstraints, MediaDevices, MediaError, MediaTrack, TrackKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const STREAM_ID: &str = "codezero-local";
const AUDIO_FRAME: Duration = Duration::from_millis(20);
const VIDEO_FRAME: Duration = Duration::from_millis(33);

// Opus silence frame.
static OPUS_SILENCE: &[u8] = &[0xf8, 0xff, 0xfe];
// Placeholder VP8 payload; receivers only need packets to flow.
static VP8_PLACEHOLDER: &[u8] = &[0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a, 0x02, 0x00, 0x02, 0x00];

/// Capture track that paces placeholder samples into a webrtc-rs sample track.
pub struct SyntheticTrack {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
    rtc: Arc<TrackLocalStaticSample>,
}

impl SyntheticTrack {
    fn new(kind: TrackKind) -> Arc<Self> {
        let codec = match kind {
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        };
        let id = kind.to_string();

        Arc::new(Self {
            rtc: Arc::new(TrackLocalStaticSample::new(
                codec,
                id.clone(),
                STREAM_ID.to_owned(),
            )),
            id,
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        })
    }

    fn spawn_pacer(self: &Arc<Self>) {
        let track = Arc::clone(self);
        let (frame, payload) = match track.kind {
            TrackKind::Audio => (AUDIO_FRAME, OPUS_SILENCE),
            TrackKind::Video => (VIDEO_FRAME, VP8_PLACEHOLDER),
        };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame);
            loop {
                ticker.tick().await;
                if track.is_stopped() {
                    break;
                }
                if !track.enabled() {
                    continue;
                }
                let sample = Sample {
                    data: Bytes::from_static(payload),
                    duration: frame,
                    ..Default::default()
                };
                if let Err(e) = track.rtc.write_sample(&sample).await {
                    debug!("Dropped {} sample: {}", track.kind, e);
                }
            }
            debug!("Pacer for {} track stopped", track.kind);
        });
    }
}

impl MediaTrack for SyntheticTrack {
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

    fn rtc_track(&self) -> Option<Arc<dyn TrackLocal + Send + Sync>> {
        Some(Arc::clone(&self.rtc) as Arc<dyn TrackLocal + Send + Sync>)
    }
}

/// Media devices for headless peers: an Opus and a VP8 track with no real capture.
#[derive(Debug, Clone, Default)]
pub struct SyntheticMedia {
    deny: bool,
}

impl SyntheticMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves like a user declining the permission prompt.
    pub fn denying() -> Self {
        Self { deny: true }
    }
}

#[async_trait]
impl MediaDevices for SyntheticMedia {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalMedia, MediaError> {
        if self.deny {
            return Err(MediaError::PermissionDenied);
        }

        let mut tracks: Vec<Arc<dyn MediaTrack>> = Vec::new();
        for (wanted, kind) in [
            (constraints.audio, TrackKind::Audio),
            (constraints.video, TrackKind::Video),
        ] {
            if !wanted {
                continue;
            }
            let track = SyntheticTrack::new(kind);
            track.spawn_pacer();
            tracks.push(track);
        }

        if tracks.is_empty() {
            return Err(MediaError::Unavailable("no track kinds requested".into()));
        }
        info!("Acquired {} synthetic track(s)", tracks.len());
        Ok(LocalMedia::new(tracks))
    }
}
