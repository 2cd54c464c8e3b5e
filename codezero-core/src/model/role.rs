use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

/// What the user asked for when starting a call. Decided once, at call start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallIntent {
    Create,
    Join(RoomId),
}

impl From<Option<RoomId>> for CallIntent {
    fn from(room: Option<RoomId>) -> Self {
        match room {
            Some(id) => Self::Join(id),
            None => Self::Create,
        }
    }
}

impl CallIntent {
    /// Resolves the intent into the room to use and the negotiation role.
    pub fn resolve(self) -> (RoomId, CallRole) {
        match self {
            Self::Create => (RoomId::mint(), CallRole::Creator),
            Self::Join(id) => (id, CallRole::Joiner),
        }
    }
}

/// Negotiation role of the local peer. The creator offers, the joiner answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallRole {
    Creator,
    Joiner,
}

impl CallRole {
    /// Single character mixed into candidate keys so both peers never collide.
    pub fn tag(self) -> char {
        match self {
            Self::Creator => 'c',
            Self::Joiner => 'j',
        }
    }
}
