mod ice;
mod peer;
mod seminar;
mod signaling;

pub use ice::IceServerConfig;
pub use peer::SessionId;
pub use seminar::{Role, SeminarId};
pub use signaling::{IceCandidate, SdpType, SessionDescription, SignalMessage};
