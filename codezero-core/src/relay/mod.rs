mod error;
mod memory;
mod path;
mod protocol;
mod store;

pub use error::RelayError;
pub use memory::{MemoryRelay, RelayConnection};
pub use path::{ICE_CANDIDATES, ROOMS, RelayPath, SIGNALING, validate_key};
pub use protocol::{RelayReply, RelayRequest};
pub use store::{RelayStore, Snapshot, Subscription};
