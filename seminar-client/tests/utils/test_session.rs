use crate::utils::{
    MockSignalingOutput, MockTransportFactory, RecordingObserver, TestCapture, WAIT_TIMEOUT_MS,
    wait_until,
};
use seminar_client::{
    ChannelEvent, ConnectionState, Orchestrator, PeerSnapshot, SeminarIdentity, SessionConfig,
    SessionHandle,
};
use seminar_core::{Role, SessionDescription, SessionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Orchestrator wired to mocks, with a hand-driven signaling channel.
pub struct TestSession {
    pub handle: SessionHandle,
    pub channel: mpsc::UnboundedSender<ChannelEvent>,
    pub signaling: MockSignalingOutput,
    pub transports: MockTransportFactory,
    pub observer: RecordingObserver,
    pub capture: TestCapture,
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        settle_delay_ms: 10,
        max_pending_candidates: 4,
        ..Default::default()
    }
}

pub fn create_test_session(role: Role) -> TestSession {
    let (channel, channel_rx) = mpsc::unbounded_channel();
    let signaling = MockSignalingOutput::new();
    let transports = MockTransportFactory::new();
    let observer = RecordingObserver::new();
    let capture = TestCapture::new();

    let username = match role {
        Role::Instructor => "prof",
        Role::Student => "ada",
    };

    let (orchestrator, handle) = Orchestrator::new(
        SeminarIdentity::new("42", username, role),
        test_config(),
        Arc::new(signaling.clone()),
        channel_rx,
        Arc::new(capture.clone()),
        Arc::new(transports.clone()),
        Arc::new(observer.clone()),
    );
    tokio::spawn(orchestrator.run());

    TestSession {
        handle,
        channel,
        signaling,
        transports,
        observer,
        capture,
    }
}

impl TestSession {
    pub fn open(&self) {
        let _ = self.channel.send(ChannelEvent::Opened { reconnected: false });
    }

    pub fn deliver(&self, message: SignalMessage) {
        let _ = self.channel.send(ChannelEvent::Message(message));
    }

    pub fn student_joined(&self, session_id: &SessionId, username: &str) {
        self.deliver(SignalMessage::UserJoined {
            username: username.to_owned(),
            role: Role::Student,
            session_id: session_id.clone(),
        });
    }

    /// Reply to the most recent offer sent toward `peer` with an answer
    /// stamped as coming from it.
    pub fn answer_latest_offer(&self, peer: &SessionId) {
        let offer = self
            .signaling
            .offers_to(peer)
            .pop()
            .expect("no offer to answer");
        self.deliver(SignalMessage::Answer {
            target: SessionId::from("local"),
            from: Some(peer.clone()),
            answer: SessionDescription::answer(offer.sdp),
        });
    }

    pub async fn wait_for_offers(&self, peer: &SessionId, count: usize) -> bool {
        wait_until(WAIT_TIMEOUT_MS, || self.signaling.offers_to(peer).len() >= count).await
    }

    pub async fn peer(&self, peer: &SessionId) -> Option<PeerSnapshot> {
        self.handle
            .peers()
            .await
            .unwrap()
            .into_iter()
            .find(|p| &p.session_id == peer)
    }

    pub async fn wait_for_state(&self, peer: &SessionId, state: ConnectionState) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(WAIT_TIMEOUT_MS);

        loop {
            if self.peer(peer).await.map(|p| p.state) == Some(state) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_for_peer_gone(&self, peer: &SessionId) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(WAIT_TIMEOUT_MS);

        loop {
            if self.peer(peer).await.is_none() {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// Student joins, gets an offer, answers it, and ICE connects.
    pub async fn connect_student(&self, peer: &SessionId, username: &str) {
        let before = self.signaling.offers_to(peer).len();
        self.student_joined(peer, username);
        assert!(self.wait_for_offers(peer, before + 1).await, "no offer sent");
        self.answer_latest_offer(peer);
        assert!(
            self.wait_for_state(peer, ConnectionState::Connected).await,
            "peer never connected"
        );
    }
}
