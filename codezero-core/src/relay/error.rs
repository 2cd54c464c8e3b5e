use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid relay path: {path}")]
    InvalidPath { path: String },
    #[error("invalid relay key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
    #[error("relay connection is closed")]
    Disconnected,
    #[error("relay transport error: {0}")]
    Transport(String),
    #[error("relay rejected the request: {message}")]
    Rejected { message: String },
    #[error("failed to encode relay frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RelayError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}
