use crate::model::{CandidateKey, RoomId};
use crate::relay::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ROOMS: &str = "rooms";
pub const SIGNALING: &str = "signaling";
pub const ICE_CANDIDATES: &str = "iceCandidates";

const FORBIDDEN: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Checks that `key` can be used as a single path segment.
pub fn validate_key(key: &str) -> Result<(), RelayError> {
    let reason = if key.is_empty() {
        "empty"
    } else if key.contains(FORBIDDEN) {
        "contains one of / . # $ [ ]"
    } else if key.chars().any(char::is_control) {
        "contains control characters"
    } else {
        return Ok(());
    };

    Err(RelayError::InvalidKey {
        key: key.to_owned(),
        reason,
    })
}

/// Slash-separated location in the relay tree. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelayPath(Vec<String>);

impl RelayPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for seg in trimmed.split('/') {
            validate_key(seg).map_err(|_| RelayError::InvalidPath {
                path: raw.to_owned(),
            })?;
            segments.push(seg.to_owned());
        }
        Ok(Self(segments))
    }

    pub fn child(&self, key: &str) -> Result<Self, RelayError> {
        validate_key(key)?;
        let mut segments = self.0.clone();
        segments.push(key.to_owned());
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// `rooms/{room}`: the room's existence marker.
    pub fn room(room: &RoomId) -> Self {
        Self(vec![ROOMS.to_owned(), room.as_str().to_owned()])
    }

    /// `rooms/{room}/signaling`: the single offer/answer slot.
    pub fn signaling(room: &RoomId) -> Self {
        Self::room(room).with(SIGNALING)
    }

    /// `rooms/{room}/iceCandidates`: the append-only candidate collection.
    pub fn candidates(room: &RoomId) -> Self {
        Self::room(room).with(ICE_CANDIDATES)
    }

    pub fn candidate(room: &RoomId, key: &CandidateKey) -> Self {
        Self::candidates(room).with(key.as_str())
    }

    // Segments passed here are already validated.
    fn with(mut self, segment: &str) -> Self {
        self.0.push(segment.to_owned());
        self
    }
}

impl TryFrom<String> for RelayPath {
    type Error = RelayError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<RelayPath> for String {
    fn from(path: RelayPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for RelayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}
