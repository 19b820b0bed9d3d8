use crate::media::MediaSourceController;
use crate::peer::{ConnectionState, NegotiationRole, PeerCommand, PeerEvent};
use crate::signaling::SignalingOutput;
use crate::transport::{IceState, MediaTransport, TransportEvent, TransportFactory};
use seminar_core::{IceCandidate, SessionDescription, SessionId, SignalMessage};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything a peer task needs from the session that owns it.
pub struct PeerContext {
    pub signaling: Arc<dyn SignalingOutput>,
    pub media: Arc<MediaSourceController>,
    pub transports: Arc<dyn TransportFactory>,
    pub transport_events: mpsc::UnboundedSender<TransportEvent>,
    pub peer_events: mpsc::UnboundedSender<PeerEvent>,
    pub settle_delay: Duration,
}

/// Handle to a running peer task.
pub struct PeerHandle {
    session_id: SessionId,
    negotiation_role: NegotiationRole,
    instance: u64,
    state: watch::Receiver<ConnectionState>,
    commands: mpsc::UnboundedSender<PeerCommand>,
    task: JoinHandle<()>,
}

impl PeerHandle {
    pub fn spawn(
        session_id: SessionId,
        negotiation_role: NegotiationRole,
        instance: u64,
        ctx: Arc<PeerContext>,
    ) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::New);

        let task = tokio::spawn(run_peer(
            session_id.clone(),
            negotiation_role,
            instance,
            ctx,
            commands_rx,
            state_tx,
        ));

        Self {
            session_id,
            negotiation_role,
            instance,
            state,
            commands,
            task,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn negotiation_role(&self) -> NegotiationRole {
        self.negotiation_role
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns `false` once the peer task has finished.
    pub fn dispatch(&self, command: PeerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Ask the task to tear down and wait for it, up to `timeout`.
    pub async fn close(self, timeout: Duration) {
        let _ = self.commands.send(PeerCommand::Close);

        let mut task = self.task;
        if tokio::time::timeout(timeout, &mut task).await.is_err() {
            warn!(session_id = %self.session_id, "Peer did not close in time, aborting");
            task.abort();
        }
    }
}

async fn run_peer(
    session_id: SessionId,
    negotiation_role: NegotiationRole,
    instance: u64,
    ctx: Arc<PeerContext>,
    commands: mpsc::UnboundedReceiver<PeerCommand>,
    state: watch::Sender<ConnectionState>,
) {
    match ctx
        .transports
        .create(&session_id, ctx.transport_events.clone())
        .await
    {
        Ok(transport) => {
            let peer = PeerTask {
                session_id: session_id.clone(),
                negotiation_role,
                ctx: ctx.clone(),
                transport,
                state,
                remote_description_set: false,
                pending_candidates: Vec::new(),
                awaiting_answer: false,
                renegotiation_pending: false,
                ice_connected: false,
            };
            peer.run(commands).await;
        }
        Err(e) => {
            error!(session_id = %session_id, "Failed to create transport: {:?}", e);
            state.send_replace(ConnectionState::Closed);
            let _ = ctx.peer_events.send(PeerEvent::StateChanged {
                session_id: session_id.clone(),
                state: ConnectionState::Closed,
            });
        }
    }

    let _ = ctx.peer_events.send(PeerEvent::Closed {
        session_id,
        instance,
    });
}

/// Offer/answer/ICE state machine for one remote participant.
struct PeerTask {
    session_id: SessionId,
    negotiation_role: NegotiationRole,
    ctx: Arc<PeerContext>,
    transport: Arc<dyn MediaTransport>,
    state: watch::Sender<ConnectionState>,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
    awaiting_answer: bool,
    /// A source change arrived while an offer was still unanswered.
    renegotiation_pending: bool,
    ice_connected: bool,
}

impl PeerTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<PeerCommand>) {
        debug!(session_id = %self.session_id, role = ?self.negotiation_role, "Peer task started");

        while let Some(command) = commands.recv().await {
            match command {
                PeerCommand::Negotiate => self.negotiate().await,
                PeerCommand::RemoteOffer(offer) => self.accept_offer(offer).await,
                PeerCommand::RemoteAnswer(answer) => self.accept_answer(answer).await,
                PeerCommand::RemoteCandidate(candidate) => self.add_candidate(candidate).await,
                PeerCommand::IceState(ice) => self.apply_ice(ice),
                PeerCommand::Close => break,
            }

            if self.current() == ConnectionState::Closed {
                break;
            }
        }

        if let Err(e) = self.transport.close().await {
            warn!(session_id = %self.session_id, "Error closing transport: {:?}", e);
        }
        self.set_state(ConnectionState::Closed);
        debug!(session_id = %self.session_id, "Peer task finished");
    }

    fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous == next {
            return;
        }

        info!(session_id = %self.session_id, from = %previous, to = %next, "Peer state changed");
        let _ = self.ctx.peer_events.send(PeerEvent::StateChanged {
            session_id: self.session_id.clone(),
            state: next,
        });
    }

    async fn negotiate(&mut self) {
        if self.negotiation_role == NegotiationRole::Responder {
            warn!(session_id = %self.session_id, "Responder peer never sends offers");
            return;
        }
        if self.awaiting_answer {
            debug!(session_id = %self.session_id, "Offer in flight, deferring renegotiation");
            self.renegotiation_pending = true;
            return;
        }

        let renegotiating = self.current() != ConnectionState::New;
        self.sync_tracks(renegotiating).await;

        let offer = match self.transport.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                error!(session_id = %self.session_id, "Failed to create offer: {:?}", e);
                return;
            }
        };

        self.awaiting_answer = true;
        self.set_state(ConnectionState::Negotiating);
        self.ctx.signaling.send(SignalMessage::Offer {
            target: self.session_id.clone(),
            from: None,
            offer,
        });
    }

    async fn accept_offer(&mut self, offer: SessionDescription) {
        if let Err(e) = self.transport.set_remote_description(offer).await {
            warn!(session_id = %self.session_id, "Rejected remote offer: {:?}", e);
            return;
        }
        self.remote_description_set = true;
        self.flush_candidates().await;

        let renegotiating = self.current() != ConnectionState::New;
        self.sync_tracks(renegotiating).await;

        let answer = match self.transport.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                error!(session_id = %self.session_id, "Failed to create answer: {:?}", e);
                return;
            }
        };

        if self.current() == ConnectionState::New {
            self.set_state(ConnectionState::Negotiating);
        }
        self.ctx.signaling.send(SignalMessage::Answer {
            target: self.session_id.clone(),
            from: None,
            answer,
        });
    }

    async fn accept_answer(&mut self, answer: SessionDescription) {
        if !self.awaiting_answer {
            warn!(session_id = %self.session_id, "Unexpected answer, dropping");
            return;
        }
        self.awaiting_answer = false;

        if let Err(e) = self.transport.set_remote_description(answer).await {
            warn!(session_id = %self.session_id, "Rejected remote answer: {:?}", e);
            return;
        }
        self.remote_description_set = true;
        self.flush_candidates().await;

        if self.ice_connected {
            self.set_state(ConnectionState::Connected);
        }

        if self.renegotiation_pending {
            self.renegotiation_pending = false;
            if self.tracks_in_sync().await {
                debug!(session_id = %self.session_id, "Answered offer already carries the active sources");
            } else {
                self.negotiate().await;
            }
        }
    }

    async fn add_candidate(&mut self, candidate: IceCandidate) {
        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            return;
        }

        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            warn!(session_id = %self.session_id, "Failed to add ICE candidate: {:?}", e);
        }
    }

    async fn flush_candidates(&mut self) {
        if self.pending_candidates.is_empty() {
            return;
        }

        debug!(
            session_id = %self.session_id,
            count = self.pending_candidates.len(),
            "Applying buffered ICE candidates"
        );
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!(session_id = %self.session_id, "Failed to add ICE candidate: {:?}", e);
            }
        }
    }

    fn apply_ice(&mut self, ice: IceState) {
        self.ice_connected = ice.is_connected();

        let current = self.current();
        let next = if ice.is_connected() && self.awaiting_answer {
            // Tracks are still being renegotiated; the answer will settle it.
            current
        } else {
            current.after_ice(ice)
        };

        if ice == IceState::Failed {
            error!(session_id = %self.session_id, "ICE failed");
        }
        self.set_state(next);
    }

    async fn tracks_in_sync(&self) -> bool {
        let desired: HashSet<String> = self
            .ctx
            .media
            .outbound_tracks()
            .await
            .into_iter()
            .map(|t| t.id)
            .collect();
        let attached: HashSet<String> = self
            .transport
            .outbound_tracks()
            .await
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        desired == attached
    }

    /// Make the transport's outbound senders match the active local sources.
    /// Unwanted tracks go first so two video senders never coexist.
    async fn sync_tracks(&self, renegotiating: bool) {
        let desired = self.ctx.media.outbound_tracks().await;
        let current = self.transport.outbound_tracks().await;

        let desired_ids: HashSet<&str> = desired.iter().map(|t| t.id.as_str()).collect();
        let mut attached: HashSet<String> = HashSet::new();
        let mut removed = false;

        for (id, kind) in current {
            if desired_ids.contains(id.as_str()) {
                attached.insert(id);
                continue;
            }
            debug!(session_id = %self.session_id, track = %id, ?kind, "Removing outbound track");
            if let Err(e) = self.transport.remove_track(&id).await {
                warn!(session_id = %self.session_id, "Failed to remove track {}: {:?}", id, e);
            }
            removed = true;
        }

        let missing: Vec<_> = desired
            .iter()
            .filter(|t| !attached.contains(&t.id))
            .collect();
        if missing.is_empty() {
            return;
        }

        if (removed || renegotiating) && !self.ctx.settle_delay.is_zero() {
            tokio::time::sleep(self.ctx.settle_delay).await;
        }

        for track in missing {
            debug!(session_id = %self.session_id, track = %track.id, kind = ?track.kind, "Adding outbound track");
            if let Err(e) = self.transport.add_track(track).await {
                warn!(session_id = %self.session_id, "Failed to add track {}: {:?}", track.id, e);
            }
        }
    }
}
