use crate::peer::{ConnectionState, NegotiationRole};
use crate::session::PeerRecord;
use seminar_core::{Role, SessionId};
use tokio::sync::oneshot;

/// Point-in-time view of one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshot {
    pub session_id: SessionId,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub negotiation_role: NegotiationRole,
    pub state: ConnectionState,
}

/// Requests from [`SessionHandle`](crate::SessionHandle)s to the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    Peers(oneshot::Sender<Vec<PeerSnapshot>>),
    Participants(oneshot::Sender<Vec<PeerRecord>>),
    Shutdown(oneshot::Sender<()>),
}
