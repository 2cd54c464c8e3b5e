use crate::relay::{RelayError, validate_key};
use crate::utils::unix_millis;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shared namespace for one call between two peers.
///
/// The id doubles as a relay key, so it is validated on construction.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Mints a fresh id from the current UNIX time in milliseconds.
    pub fn mint() -> Self {
        Self(unix_millis().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = RelayError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate_key(&s)?;
        Ok(Self(s))
    }
}

impl FromStr for RoomId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
