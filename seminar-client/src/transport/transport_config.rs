use seminar_core::IceServerConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub ice_candidate_pool_size: u8,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: IceServerConfig::defaults(),
            ice_candidate_pool_size: 10,
        }
    }
}
