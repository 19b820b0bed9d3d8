use seminar_core::{Role, SeminarId, SessionId};
use std::collections::HashMap;

/// Who the local participant is inside a seminar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeminarIdentity {
    pub seminar_id: SeminarId,
    pub username: String,
    pub role: Role,
}

impl SeminarIdentity {
    pub fn new(seminar_id: impl Into<SeminarId>, username: impl Into<String>, role: Role) -> Self {
        Self {
            seminar_id: seminar_id.into(),
            username: username.into(),
            role,
        }
    }

    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }
}

/// What is known about a remote participant. Username and role stay empty
/// until a `user-joined` (or `instructor-stream-available`) names them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub session_id: SessionId,
    pub username: Option<String>,
    pub role: Option<Role>,
}

/// Local identity plus every remote participant seen on the channel.
#[derive(Debug)]
pub struct SessionRegistry {
    identity: SeminarIdentity,
    peers: HashMap<SessionId, PeerRecord>,
}

impl SessionRegistry {
    pub fn new(identity: SeminarIdentity) -> Self {
        Self {
            identity,
            peers: HashMap::new(),
        }
    }

    pub fn identity(&self) -> &SeminarIdentity {
        &self.identity
    }

    pub fn record_local_identity(&mut self, identity: SeminarIdentity) {
        self.identity = identity;
    }

    /// Insert or refresh a peer. Fields passed as `None` keep their stored
    /// value. Returns `true` when the peer was not known before.
    pub fn upsert_peer(
        &mut self,
        session_id: &SessionId,
        username: Option<&str>,
        role: Option<Role>,
    ) -> bool {
        let mut created = false;
        let record = self.peers.entry(session_id.clone()).or_insert_with(|| {
            created = true;
            PeerRecord {
                session_id: session_id.clone(),
                username: None,
                role: None,
            }
        });

        if let Some(username) = username {
            record.username = Some(username.to_owned());
        }
        if role.is_some() {
            record.role = role;
        }

        created
    }

    pub fn get_peer(&self, session_id: &SessionId) -> Option<&PeerRecord> {
        self.peers.get(session_id)
    }

    pub fn remove_peer(&mut self, session_id: &SessionId) -> Option<PeerRecord> {
        self.peers.remove(session_id)
    }

    pub fn remove_all_peers(&mut self) {
        self.peers.clear();
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
