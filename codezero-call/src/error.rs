use crate::media::MediaError;
use codezero_core::relay::RelayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("camera or microphone access was denied")]
    PermissionDenied,
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),
    #[error("call was ended before it started")]
    Cancelled,
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error("negotiation failed: {0}")]
    Negotiation(String),
    #[error("call controller has shut down")]
    ControllerGone,
}

impl CallError {
    pub(crate) fn negotiation(err: anyhow::Error) -> Self {
        Self::Negotiation(format!("{:#}", err))
    }
}

impl From<MediaError> for CallError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::PermissionDenied => Self::PermissionDenied,
            MediaError::Unavailable(reason) => Self::MediaUnavailable(reason),
        }
    }
}
