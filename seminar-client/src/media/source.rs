use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn from_codec_type(codec: RTPCodecType) -> Option<Self> {
        match codec {
            RTPCodecType::Audio => Some(MediaKind::Audio),
            RTPCodecType::Video => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Kind-class of a local source; at most one of each is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Microphone,
    Screen,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Microphone => f.write_str("microphone"),
            SourceKind::Screen => f.write_str("screen"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplaySurface {
    #[default]
    Monitor,
    Window,
    BrowserTab,
}

/// A captured track ready to be attached to peer connections.
#[derive(Clone)]
pub struct LocalTrack {
    pub id: String,
    pub kind: MediaKind,
    pub track: Arc<dyn TrackLocal + Send + Sync>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        Self {
            id: track.id().to_owned(),
            kind,
            track,
        }
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MediaSource {
    pub kind: SourceKind,
    pub tracks: Vec<LocalTrack>,
}

impl MediaSource {
    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == MediaKind::Video)
    }

    pub fn track_ids(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.id.as_str()).collect()
    }
}
