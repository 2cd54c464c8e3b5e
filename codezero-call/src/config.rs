use codezero_core::IceServerConfig;
use codezero_core::utils::{
    DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3, DEFAULT_STUN_ADDR_4,
};
use serde::{Deserialize, Serialize};

/// Settings for one participant's side of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// WebSocket endpoint of the relay store.
    pub relay_url: String,
    /// Page URL the `roomId` parameter is appended to when sharing a call.
    pub share_base_url: String,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![
                    DEFAULT_STUN_ADDR.to_owned(),
                    DEFAULT_STUN_ADDR_2.to_owned(),
                    DEFAULT_STUN_ADDR_3.to_owned(),
                    DEFAULT_STUN_ADDR_4.to_owned(),
                ],
                username: None,
                credential: None,
            }],
            relay_url: "ws://127.0.0.1:8787/relay".to_owned(),
            share_base_url: "http://localhost:9002/".to_owned(),
        }
    }
}
