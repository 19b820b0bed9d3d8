use axum::extract::ws::Message;
use seminar_core::{SessionId, SignalMessage};
use tokio::sync::mpsc;

/// Commands a seminar room receives from its WebSocket handlers.
#[derive(Debug)]
pub enum RoomCommand {
    /// A socket was accepted; `tx` feeds its outbound half.
    Connect {
        session_id: SessionId,
        tx: mpsc::UnboundedSender<Message>,
    },

    /// A parsed message arrived on the socket of `session_id`.
    Signal {
        session_id: SessionId,
        message: SignalMessage,
    },

    Disconnect { session_id: SessionId },
}
