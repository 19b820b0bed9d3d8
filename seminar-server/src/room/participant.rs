use axum::extract::ws::Message;
use seminar_core::{Role, SessionId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{error, warn};

/// One connected socket of a seminar room.
#[derive(Debug)]
pub struct Participant {
    pub session_id: SessionId,
    /// Set by the first `join`; `None` until then.
    pub username: Option<String>,
    pub role: Option<Role>,
    tx: mpsc::UnboundedSender<Message>,
}

impl Participant {
    pub fn new(session_id: SessionId, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            session_id,
            username: None,
            role: None,
            tx,
        }
    }

    pub fn is_instructor(&self) -> bool {
        self.role == Some(Role::Instructor)
    }

    /// `user-joined` describing this participant, once it has joined.
    pub fn announcement(&self) -> Option<SignalMessage> {
        Some(SignalMessage::UserJoined {
            username: self.username.clone()?,
            role: self.role?,
            session_id: self.session_id.clone(),
        })
    }

    pub fn send(&self, message: &SignalMessage) {
        match serde_json::to_string(message) {
            Ok(json) => {
                if self.tx.send(Message::Text(json.into())).is_err() {
                    warn!(
                        session_id = %self.session_id,
                        kind = message.kind(),
                        "Socket already gone, dropping message"
                    );
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}
