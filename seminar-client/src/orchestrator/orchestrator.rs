use crate::config::SessionConfig;
use crate::media::{MediaCapture, MediaEvent, MediaSourceController, SourceKind};
use crate::orchestrator::{PeerSnapshot, SessionCommand, SessionHandle, SessionObserver};
use crate::peer::{NegotiationRole, PeerCommand, PeerConnectionManager, PeerContext, PeerEvent};
use crate::session::{SeminarIdentity, SessionRegistry};
use crate::signaling::{ChannelEvent, SignalingOutput};
use crate::transport::{TransportEvent, TransportFactory};
use seminar_core::{IceCandidate, Role, SessionId, SignalMessage};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Event loop tying the signaling channel, the peers and the local media
/// together for one seminar session.
pub struct Orchestrator {
    registry: SessionRegistry,
    config: SessionConfig,
    signaling: Arc<dyn SignalingOutput>,
    observer: Arc<dyn SessionObserver>,
    media: Arc<MediaSourceController>,
    peers: PeerConnectionManager,
    /// Candidates for peers that do not exist yet.
    pending_candidates: HashMap<SessionId, VecDeque<IceCandidate>>,
    screen_sharing: bool,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    signal_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
}

impl Orchestrator {
    pub fn new(
        identity: SeminarIdentity,
        config: SessionConfig,
        signaling: Arc<dyn SignalingOutput>,
        signal_rx: mpsc::UnboundedReceiver<ChannelEvent>,
        capture: Arc<dyn MediaCapture>,
        transports: Arc<dyn TransportFactory>,
        observer: Arc<dyn SessionObserver>,
    ) -> (Self, SessionHandle) {
        let (media, media_rx) =
            MediaSourceController::new(capture, config.audio.clone(), config.display.clone());
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let ctx = Arc::new(PeerContext {
            signaling: signaling.clone(),
            media: media.clone(),
            transports,
            transport_events: transport_tx,
            peer_events: peer_tx,
            settle_delay: config.settle_delay(),
        });

        let handle = SessionHandle::new(command_tx, media.clone(), identity.clone());

        let orchestrator = Self {
            registry: SessionRegistry::new(identity),
            config,
            signaling,
            observer,
            media,
            peers: PeerConnectionManager::new(ctx),
            pending_candidates: HashMap::new(),
            screen_sharing: false,
            command_rx,
            signal_rx,
            media_rx,
            transport_rx,
            peer_rx,
        };

        (orchestrator, handle)
    }

    pub async fn run(mut self) {
        let identity = self.registry.identity().clone();
        info!(
            seminar = %identity.seminar_id,
            username = %identity.username,
            role = %identity.role,
            "Session loop started"
        );

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Peers(reply)) => {
                            let _ = reply.send(self.snapshot());
                        }
                        Some(SessionCommand::Participants(reply)) => {
                            let mut records: Vec<_> = self.registry.peers().cloned().collect();
                            records.sort_by(|a, b| a.session_id.cmp(&b.session_id));
                            let _ = reply.send(records);
                        }
                        Some(SessionCommand::Shutdown(done)) => {
                            self.shutdown().await;
                            let _ = done.send(());
                            break;
                        }
                        None => {
                            info!("All session handles dropped. Leaving seminar.");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                Some(event) = self.signal_rx.recv() => self.handle_channel_event(event).await,

                Some(event) = self.media_rx.recv() => self.handle_media_event(event),

                Some(event) = self.transport_rx.recv() => self.handle_transport_event(event),

                Some(event) = self.peer_rx.recv() => self.handle_peer_event(event),
            }
        }

        info!(seminar = %identity.seminar_id, "Session loop finished");
    }

    fn is_instructor(&self) -> bool {
        self.registry.identity().is_instructor()
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened { reconnected } => {
                if reconnected {
                    info!("Signaling reopened, rejoining from scratch");
                    self.reset_peers().await;
                }
                self.announce();
            }

            ChannelEvent::Message(message) => self.handle_signal(message),

            ChannelEvent::Reconnecting { attempt, delay } => {
                self.observer.on_reconnecting(attempt, delay);
            }

            ChannelEvent::Disconnected {
                code,
                reason,
                fatal,
            } => {
                self.observer.on_disconnected(code, &reason, fatal);
                if fatal {
                    error!(code, %reason, "Signaling lost for good, closing peers");
                    self.reset_peers().await;
                }
            }
        }
    }

    /// Join the room; an instructor also announces its stream.
    fn announce(&self) {
        let identity = self.registry.identity();
        self.signaling.send(SignalMessage::Join {
            username: identity.username.clone(),
            role: identity.role,
        });

        if identity.is_instructor() {
            self.signaling.send(SignalMessage::InstructorStreamStart);
            if self.screen_sharing {
                self.signaling.send(SignalMessage::ScreenShareStart);
            }
        }
    }

    fn handle_signal(&mut self, message: SignalMessage) {
        let origin = message.origin().cloned();

        match message {
            SignalMessage::UserJoined {
                username,
                role,
                session_id,
            } => {
                info!(session_id = %session_id, %username, %role, "Participant joined");
                self.observer.on_participant_joined(&username, role);
                // Only the other role is ever peered with, so only it is tracked.
                if role != self.registry.identity().role {
                    self.registry
                        .upsert_peer(&session_id, Some(&username), Some(role));
                }

                if self.is_instructor() && role == Role::Student {
                    let (peer, created) = self.peers.ensure(&session_id, NegotiationRole::Initiator);
                    if created {
                        peer.dispatch(PeerCommand::Negotiate);
                    }
                    self.flush_pending(&session_id);
                }
            }

            SignalMessage::InstructorStreamAvailable {
                instructor_session_id,
            } => {
                if !self.is_instructor() {
                    self.registry
                        .upsert_peer(&instructor_session_id, None, Some(Role::Instructor));
                    let (_, created) = self
                        .peers
                        .ensure(&instructor_session_id, NegotiationRole::Responder);
                    if created {
                        debug!(session_id = %instructor_session_id, "Waiting for instructor offer");
                    }
                    self.flush_pending(&instructor_session_id);
                }
                self.observer
                    .on_instructor_stream_available(&instructor_session_id);
            }

            SignalMessage::Offer { offer, .. } => {
                let Some(origin) = origin else { return };
                self.registry.upsert_peer(&origin, None, None);
                let (peer, _) = self.peers.ensure(&origin, NegotiationRole::Responder);
                peer.dispatch(PeerCommand::RemoteOffer(offer));
                self.flush_pending(&origin);
            }

            SignalMessage::Answer { answer, .. } => {
                let Some(origin) = origin else { return };
                if !self.peers.dispatch(&origin, PeerCommand::RemoteAnswer(answer)) {
                    warn!(session_id = %origin, "Answer for unknown peer, dropping");
                }
            }

            SignalMessage::IceCandidate { candidate, .. } => {
                let Some(origin) = origin else { return };
                if self.peers.contains(&origin) {
                    self.peers
                        .dispatch(&origin, PeerCommand::RemoteCandidate(candidate));
                } else {
                    self.buffer_candidate(origin, candidate);
                }
            }

            SignalMessage::ScreenShareStart => self.observer.on_screen_share_start(),

            SignalMessage::ScreenShareStop => self.observer.on_screen_share_stop(),

            other @ (SignalMessage::Join { .. } | SignalMessage::InstructorStreamStart) => {
                debug!(kind = other.kind(), "Ignoring relay-bound message");
            }
        }
    }

    fn buffer_candidate(&mut self, session_id: SessionId, candidate: IceCandidate) {
        let limit = self.config.max_pending_candidates;
        let queue = self.pending_candidates.entry(session_id.clone()).or_default();

        if queue.len() >= limit {
            warn!(session_id = %session_id, limit, "Too many early ICE candidates, dropping oldest");
            queue.pop_front();
        }
        if limit > 0 {
            queue.push_back(candidate);
        }
        debug!(session_id = %session_id, buffered = queue.len(), "Buffered ICE candidate for unknown peer");
    }

    fn flush_pending(&mut self, session_id: &SessionId) {
        let Some(candidates) = self.pending_candidates.remove(session_id) else {
            return;
        };

        for candidate in candidates {
            self.peers
                .dispatch(session_id, PeerCommand::RemoteCandidate(candidate));
        }
    }

    fn handle_media_event(&mut self, event: MediaEvent) {
        info!(?event, "Local media changed");
        if !self.is_instructor() {
            return;
        }

        for peer in self.peers.iter() {
            if peer.negotiation_role() == NegotiationRole::Initiator
                && peer.state().accepts_renegotiation()
            {
                peer.dispatch(PeerCommand::Negotiate);
            }
        }

        match event {
            MediaEvent::Started(SourceKind::Screen) if !self.screen_sharing => {
                self.screen_sharing = true;
                self.signaling.send(SignalMessage::ScreenShareStart);
            }
            MediaEvent::Stopped(SourceKind::Screen) if self.screen_sharing => {
                self.screen_sharing = false;
                self.signaling.send(SignalMessage::ScreenShareStop);
            }
            MediaEvent::Started(SourceKind::Microphone) => {
                self.signaling.send(SignalMessage::InstructorStreamStart);
            }
            _ => {}
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::IceStateChanged(session_id, state) => {
                self.peers
                    .dispatch(&session_id, PeerCommand::IceState(state));
            }

            TransportEvent::CandidateGenerated(session_id, candidate) => {
                self.signaling.send(SignalMessage::IceCandidate {
                    target: session_id,
                    from: None,
                    candidate,
                });
            }

            TransportEvent::TrackReceived(session_id, track) => {
                info!(session_id = %session_id, track = %track.track_id, "Remote stream received");
                self.observer.on_remote_stream(&track, &session_id);
            }
        }
    }

    fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::StateChanged { session_id, state } => {
                self.observer.on_peer_state_changed(&session_id, state);
            }

            PeerEvent::Closed {
                session_id,
                instance,
            } => {
                if self.peers.evict(&session_id, instance) {
                    self.registry.remove_peer(&session_id);
                    info!(session_id = %session_id, "Peer closed and evicted");
                }
            }
        }
    }

    fn snapshot(&self) -> Vec<PeerSnapshot> {
        let mut peers: Vec<_> = self
            .peers
            .iter()
            .map(|peer| {
                let record = self.registry.get_peer(peer.session_id());
                PeerSnapshot {
                    session_id: peer.session_id().clone(),
                    username: record.and_then(|r| r.username.clone()),
                    role: record.and_then(|r| r.role),
                    negotiation_role: peer.negotiation_role(),
                    state: peer.state(),
                }
            })
            .collect();

        peers.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        peers
    }

    async fn reset_peers(&mut self) {
        self.peers.close_all().await;
        self.registry.remove_all_peers();
        self.pending_candidates.clear();
    }

    async fn shutdown(&mut self) {
        info!("Leaving seminar");
        self.reset_peers().await;
        self.media.stop_all().await;
        self.signaling.close().await;
    }
}
