use crate::room::{Participant, RoomCommand};
use axum::extract::ws::Message;
use seminar_core::{Role, SeminarId, SessionId, SignalMessage};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Relay for one seminar. Owns its participants and runs until every
/// command sender is gone.
pub struct SeminarRoom {
    seminar_id: SeminarId,
    participants: HashMap<SessionId, Participant>,
    /// Instructor that announced its stream, replayed to late students.
    instructor_stream: Option<SessionId>,
    screen_sharing: bool,
    command_rx: mpsc::Receiver<RoomCommand>,
}

impl SeminarRoom {
    pub fn new(seminar_id: SeminarId, command_rx: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            seminar_id,
            participants: HashMap::new(),
            instructor_stream: None,
            screen_sharing: false,
            command_rx,
        }
    }

    pub async fn run(mut self) {
        info!(seminar = %self.seminar_id, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }

        info!(seminar = %self.seminar_id, "Command channel closed. Room finished.");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Connect { session_id, tx } => self.connect(session_id, tx),

            RoomCommand::Signal {
                session_id,
                message,
            } => self.handle_signal(session_id, message),

            RoomCommand::Disconnect { session_id } => self.disconnect(&session_id),
        }
    }

    fn connect(&mut self, session_id: SessionId, tx: mpsc::UnboundedSender<Message>) {
        info!(seminar = %self.seminar_id, session_id = %session_id, "Participant connected");
        self.participants
            .insert(session_id.clone(), Participant::new(session_id, tx));
    }

    fn disconnect(&mut self, session_id: &SessionId) {
        let Some(participant) = self.participants.remove(session_id) else {
            return;
        };
        info!(
            seminar = %self.seminar_id,
            session_id = %session_id,
            username = ?participant.username,
            remaining = self.participants.len(),
            "Participant left"
        );

        if self.instructor_stream.as_ref() == Some(session_id) {
            self.instructor_stream = None;
            self.screen_sharing = false;
        }
    }

    fn handle_signal(&mut self, sender: SessionId, message: SignalMessage) {
        if !self.participants.contains_key(&sender) {
            warn!(session_id = %sender, kind = message.kind(), "Message from unknown socket");
            return;
        }

        match message {
            SignalMessage::Join { username, role } => self.join(&sender, username, role),

            routed @ (SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::IceCandidate { .. }) => self.route(&sender, routed),

            SignalMessage::InstructorStreamStart => {
                if !self.is_instructor(&sender) {
                    warn!(session_id = %sender, "Stream announcement from a non-instructor, ignoring");
                    return;
                }
                self.instructor_stream = Some(sender.clone());
                self.broadcast(
                    &sender,
                    &SignalMessage::InstructorStreamAvailable {
                        instructor_session_id: sender.clone(),
                    },
                );
            }

            share @ (SignalMessage::ScreenShareStart | SignalMessage::ScreenShareStop) => {
                if !self.is_instructor(&sender) {
                    warn!(session_id = %sender, kind = share.kind(), "Screen share from a non-instructor, ignoring");
                    return;
                }
                self.screen_sharing = share == SignalMessage::ScreenShareStart;
                self.broadcast(&sender, &share);
            }

            other @ (SignalMessage::UserJoined { .. }
            | SignalMessage::InstructorStreamAvailable { .. }) => {
                warn!(session_id = %sender, kind = other.kind(), "Relay-only message from a client, ignoring");
            }
        }
    }

    fn join(&mut self, sender: &SessionId, username: String, role: Role) {
        let Some(participant) = self.participants.get_mut(sender) else {
            return;
        };
        if participant.username.as_deref() == Some(username.as_str()) {
            debug!(session_id = %sender, %username, "Repeated join on the same socket, ignoring");
            return;
        }

        participant.username = Some(username.clone());
        participant.role = Some(role);
        info!(seminar = %self.seminar_id, session_id = %sender, %username, %role, "Participant joined");

        let Some(newcomer) = self.participants.get(sender) else {
            return;
        };
        for other in self.participants.values() {
            if &other.session_id == sender {
                continue;
            }
            if let Some(roster) = other.announcement() {
                newcomer.send(&roster);
            }
        }

        if let Some(announcement) = newcomer.announcement() {
            self.broadcast(sender, &announcement);
        }

        if role == Role::Student
            && let Some(instructor) = &self.instructor_stream
        {
            newcomer.send(&SignalMessage::InstructorStreamAvailable {
                instructor_session_id: instructor.clone(),
            });
            if self.screen_sharing {
                newcomer.send(&SignalMessage::ScreenShareStart);
            }
        }
    }

    /// Deliver an offer, answer or candidate to its `target`, stamped with
    /// the sender's session id.
    fn route(&self, sender: &SessionId, message: SignalMessage) {
        let target = match &message {
            SignalMessage::Offer { target, .. }
            | SignalMessage::Answer { target, .. }
            | SignalMessage::IceCandidate { target, .. } => target.clone(),
            _ => return,
        };

        match self.participants.get(&target) {
            Some(receiver) => {
                debug!(from = %sender, to = %target, kind = message.kind(), "Routing");
                receiver.send(&message.stamped(sender));
            }
            None => {
                warn!(from = %sender, to = %target, kind = message.kind(), "Target not in room, dropping");
            }
        }
    }

    fn broadcast(&self, sender: &SessionId, message: &SignalMessage) {
        for participant in self.participants.values() {
            if &participant.session_id != sender {
                participant.send(message);
            }
        }
    }

    fn is_instructor(&self, session_id: &SessionId) -> bool {
        self.participants
            .get(session_id)
            .is_some_and(Participant::is_instructor)
    }
}
