use crate::model::peer::SessionId;
use crate::model::seminar::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description in the shape browsers exchange: `{type, sdp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Messages exchanged over the per-seminar signaling socket.
///
/// Routed messages (`offer`, `answer`, `ice-candidate`) name the receiving
/// participant in `target`; the relay stamps `from` with the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    Join {
        username: String,
        role: Role,
    },
    Offer {
        target: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SessionId>,
        offer: SessionDescription,
    },
    Answer {
        target: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SessionId>,
        answer: SessionDescription,
    },
    IceCandidate {
        target: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SessionId>,
        candidate: IceCandidate,
    },
    InstructorStreamStart,
    #[serde(rename_all = "camelCase")]
    InstructorStreamAvailable {
        instructor_session_id: SessionId,
    },
    #[serde(rename_all = "camelCase")]
    UserJoined {
        username: String,
        role: Role,
        session_id: SessionId,
    },
    ScreenShareStart,
    ScreenShareStop,
}

impl SignalMessage {
    /// Wire discriminator of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::Join { .. } => "join",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::IceCandidate { .. } => "ice-candidate",
            SignalMessage::InstructorStreamStart => "instructor-stream-start",
            SignalMessage::InstructorStreamAvailable { .. } => "instructor-stream-available",
            SignalMessage::UserJoined { .. } => "user-joined",
            SignalMessage::ScreenShareStart => "screen-share-start",
            SignalMessage::ScreenShareStop => "screen-share-stop",
        }
    }

    /// Participant that sent a routed message: the relay-stamped `from`,
    /// falling back to `target` for relays that do not stamp it.
    pub fn origin(&self) -> Option<&SessionId> {
        match self {
            SignalMessage::Offer { target, from, .. }
            | SignalMessage::Answer { target, from, .. }
            | SignalMessage::IceCandidate { target, from, .. } => {
                Some(from.as_ref().unwrap_or(target))
            }
            _ => None,
        }
    }

    /// Copy of a routed message with `from` set to `sender`.
    pub fn stamped(self, sender: &SessionId) -> Self {
        match self {
            SignalMessage::Offer { target, offer, .. } => SignalMessage::Offer {
                target,
                from: Some(sender.clone()),
                offer,
            },
            SignalMessage::Answer { target, answer, .. } => SignalMessage::Answer {
                target,
                from: Some(sender.clone()),
                answer,
            },
            SignalMessage::IceCandidate {
                target, candidate, ..
            } => SignalMessage::IceCandidate {
                target,
                from: Some(sender.clone()),
                candidate,
            },
            other => other,
        }
    }
}
