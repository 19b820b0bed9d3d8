use crate::peer::ConnectionState;
use crate::transport::RemoteTrack;
use seminar_core::{Role, SessionId};
use std::time::Duration;

/// UI-facing notifications, invoked synchronously from the session loop.
/// Implementations must not block.
pub trait SessionObserver: Send + Sync {
    fn on_remote_stream(&self, _track: &RemoteTrack, _peer: &SessionId) {}

    fn on_participant_joined(&self, _username: &str, _role: Role) {}

    fn on_instructor_stream_available(&self, _instructor: &SessionId) {}

    fn on_screen_share_start(&self) {}

    fn on_screen_share_stop(&self) {}

    fn on_peer_state_changed(&self, _peer: &SessionId, _state: ConnectionState) {}

    fn on_reconnecting(&self, _attempt: u32, _delay: Duration) {}

    fn on_disconnected(&self, _code: u16, _reason: &str, _fatal: bool) {}
}
