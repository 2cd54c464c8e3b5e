mod candidate;
mod role;
mod room;
mod signaling;

pub use candidate::{CandidateKey, CandidateKeyGen, IceCandidate};
pub use role::{CallIntent, CallRole};
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalingMessage};
