use crate::transport::IceState;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    New,
    Negotiating,
    Connected,
    Reconnecting,
    Closed,
}

impl ConnectionState {
    /// State after the transport reports `ice`. `Closed` is terminal.
    pub fn after_ice(self, ice: IceState) -> Self {
        if self == ConnectionState::Closed {
            return self;
        }

        match ice {
            IceState::Connected | IceState::Completed => ConnectionState::Connected,
            IceState::Disconnected => ConnectionState::Reconnecting,
            IceState::Failed | IceState::Closed => ConnectionState::Closed,
            IceState::New | IceState::Checking => self,
        }
    }

    /// Every peer that is still alive follows local source changes, including
    /// one whose first offer is in flight or whose ICE is recovering.
    pub fn accepts_renegotiation(self) -> bool {
        self != ConnectionState::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::New => "new",
            ConnectionState::Negotiating => "negotiating",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Which side of a peer pair sends offers. Fixed when the peer is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationRole {
    Initiator,
    Responder,
}
