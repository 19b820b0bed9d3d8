use crate::peer::{NegotiationRole, PeerCommand, PeerContext, PeerHandle};
use futures::future::join_all;
use seminar_core::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const PEER_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// All live peers of one session, keyed by remote session id.
pub struct PeerConnectionManager {
    ctx: Arc<PeerContext>,
    peers: HashMap<SessionId, PeerHandle>,
    next_instance: u64,
}

impl PeerConnectionManager {
    pub fn new(ctx: Arc<PeerContext>) -> Self {
        Self {
            ctx,
            peers: HashMap::new(),
            next_instance: 0,
        }
    }

    /// Return the peer for `session_id`, spawning it with `role` if absent.
    /// The role of an existing peer is never changed.
    pub fn ensure(&mut self, session_id: &SessionId, role: NegotiationRole) -> (&PeerHandle, bool) {
        let mut created = false;
        let ctx = &self.ctx;
        let next_instance = &mut self.next_instance;

        let handle = self.peers.entry(session_id.clone()).or_insert_with(|| {
            created = true;
            *next_instance += 1;
            info!(session_id = %session_id, ?role, "Creating peer");
            PeerHandle::spawn(session_id.clone(), role, *next_instance, ctx.clone())
        });

        (handle, created)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.peers.contains_key(session_id)
    }

    /// Returns `false` if there is no such peer or its task has ended.
    pub fn dispatch(&self, session_id: &SessionId, command: PeerCommand) -> bool {
        match self.peers.get(session_id) {
            Some(peer) => peer.dispatch(command),
            None => false,
        }
    }

    /// Drop a peer whose task reported itself closed. A stale report from a
    /// replaced peer with the same session id is ignored.
    pub fn evict(&mut self, session_id: &SessionId, instance: u64) -> bool {
        if self.peers.get(session_id).map(PeerHandle::instance) != Some(instance) {
            debug!(session_id = %session_id, instance, "Ignoring stale peer close");
            return false;
        }
        self.peers.remove(session_id);
        true
    }

    /// Tear every peer down in parallel; failures are only logged.
    pub async fn close_all(&mut self) {
        if self.peers.is_empty() {
            return;
        }

        info!(count = self.peers.len(), "Closing all peers");
        let closing = self
            .peers
            .drain()
            .map(|(_, peer)| peer.close(PEER_CLOSE_TIMEOUT));
        join_all(closing).await;
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerHandle> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
