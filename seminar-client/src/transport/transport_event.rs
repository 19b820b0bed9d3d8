use crate::media::MediaKind;
use seminar_core::{IceCandidate, SessionId};
use std::fmt;
use std::sync::Arc;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IceState {
    pub fn from_rtc(state: RTCIceConnectionState) -> Option<Self> {
        match state {
            RTCIceConnectionState::New => Some(IceState::New),
            RTCIceConnectionState::Checking => Some(IceState::Checking),
            RTCIceConnectionState::Connected => Some(IceState::Connected),
            RTCIceConnectionState::Completed => Some(IceState::Completed),
            RTCIceConnectionState::Disconnected => Some(IceState::Disconnected),
            RTCIceConnectionState::Failed => Some(IceState::Failed),
            RTCIceConnectionState::Closed => Some(IceState::Closed),
            _ => None,
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, IceState::Connected | IceState::Completed)
    }
}

/// Media received from a remote participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub track_id: String,
    pub stream_id: String,
    pub kind: Option<MediaKind>,
    /// The live track; absent for transports that do not carry real media.
    pub track: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("track_id", &self.track_id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum TransportEvent {
    IceStateChanged(SessionId, IceState),
    CandidateGenerated(SessionId, IceCandidate),
    TrackReceived(SessionId, RemoteTrack),
}
