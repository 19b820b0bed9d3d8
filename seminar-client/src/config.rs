use crate::media::{AudioConstraints, DisplayConstraints};
use crate::transport::TransportConfig;
use seminar_core::SeminarId;
use seminar_core::utils::LIVE_STREAM_PATH;
use serde::Deserialize;
use std::time::Duration;

/// Everything a seminar session needs besides its identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base WebSocket URL; the seminar id is appended as the last path segment.
    pub signaling_url: String,
    pub reconnect: ReconnectConfig,
    pub transport: TransportConfig,
    pub audio: AudioConstraints,
    pub display: DisplayConstraints,
    /// Pause between dropping outbound tracks and adding their replacements.
    pub settle_delay_ms: u64,
    /// Upper bound of ICE candidates buffered for a peer that does not exist yet.
    pub max_pending_candidates: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signaling_url: format!("ws://localhost:8080{LIVE_STREAM_PATH}"),
            reconnect: ReconnectConfig::default(),
            transport: TransportConfig::default(),
            audio: AudioConstraints::default(),
            display: DisplayConstraints::default(),
            settle_delay_ms: 200,
            max_pending_candidates: 64,
        }
    }
}

impl SessionConfig {
    pub fn endpoint(&self, seminar_id: &SeminarId) -> String {
        format!("{}/{}", self.signaling_url.trim_end_matches('/'), seminar_id)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Exponential backoff applied after an unexpected signaling closure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    /// `min(base * 2^attempt, cap)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}
