use serde::{Deserialize, Serialize};

use crate::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    /// Public STUN servers used when nothing else is configured.
    pub fn defaults() -> Vec<Self> {
        vec![Self::stun(DEFAULT_STUN_ADDR), Self::stun(DEFAULT_STUN_ADDR_2)]
    }
}
