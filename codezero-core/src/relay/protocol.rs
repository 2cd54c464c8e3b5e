use crate::relay::{RelayPath, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client to server frame of the relay WebSocket protocol.
///
/// Subscription ids are allocated by the client so snapshots can be routed
/// before the acknowledgement arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum RelayRequest {
    Subscribe { id: u64, sub: u64, path: RelayPath },
    Unsubscribe { id: u64, sub: u64 },
    Write { id: u64, path: RelayPath, value: Value },
    Remove { id: u64, path: RelayPath },
    RemoveOnDisconnect { id: u64, path: RelayPath },
}

impl RelayRequest {
    pub fn id(&self) -> u64 {
        match self {
            Self::Subscribe { id, .. }
            | Self::Unsubscribe { id, .. }
            | Self::Write { id, .. }
            | Self::Remove { id, .. }
            | Self::RemoveOnDisconnect { id, .. } => *id,
        }
    }
}

/// Server to client frame of the relay WebSocket protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum RelayReply {
    Ack { id: u64 },
    Error { id: u64, message: String },
    Snapshot { sub: u64, value: Snapshot },
}
