use crate::model::role::CallRole;
use crate::relay::{RelayError, validate_key};
use crate::utils::unix_millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network candidate record, in the browser's `RTCIceCandidateInit` JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Key of one entry in the room's candidate collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateKey(String);

impl CandidateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CandidateKey {
    type Error = RelayError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate_key(&s)?;
        Ok(Self(s))
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints time-ordered candidate keys that never collide with the remote peer's.
///
/// Format: `{unix_millis:013}-{role_tag}{seq:04}`.
#[derive(Debug)]
pub struct CandidateKeyGen {
    tag: char,
    seq: u32,
}

impl CandidateKeyGen {
    pub fn new(role: CallRole) -> Self {
        Self {
            tag: role.tag(),
            seq: 0,
        }
    }

    pub fn next_key(&mut self) -> CandidateKey {
        let key = format!("{:013}-{}{:04}", unix_millis(), self.tag, self.seq);
        self.seq = self.seq.wrapping_add(1);
        CandidateKey(key)
    }
}
