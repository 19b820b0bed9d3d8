use crate::media::DisplaySurface;
use serde::Deserialize;

/// Microphone capture settings. Camera video is never requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    pub sample_rate: u32,
    pub channel_count: u16,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            sample_rate: 48_000,
            channel_count: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayConstraints {
    pub surface: DisplaySurface,
    pub width: u32,
    pub height: u32,
    pub max_frame_rate: u32,
    /// Ask for the shared surface's own audio alongside the video.
    pub system_audio: bool,
}

impl Default for DisplayConstraints {
    fn default() -> Self {
        Self {
            surface: DisplaySurface::Monitor,
            width: 1280,
            height: 720,
            max_frame_rate: 30,
            system_audio: true,
        }
    }
}

impl DisplayConstraints {
    pub fn for_surface(&self, surface: DisplaySurface) -> Self {
        Self {
            surface,
            ..self.clone()
        }
    }
}
