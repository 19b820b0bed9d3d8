use crate::peer::ConnectionState;
use crate::transport::IceState;
use seminar_core::{IceCandidate, SessionDescription, SessionId};

/// Work queued for one peer; applied strictly in order.
#[derive(Debug)]
pub enum PeerCommand {
    /// Sync outbound tracks with the active sources and send a fresh offer.
    Negotiate,
    RemoteOffer(SessionDescription),
    RemoteAnswer(SessionDescription),
    RemoteCandidate(IceCandidate),
    IceState(IceState),
    Close,
}

/// Reported by peer tasks back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    StateChanged {
        session_id: SessionId,
        state: ConnectionState,
    },
    Closed {
        session_id: SessionId,
        instance: u64,
    },
}
