
use crate::utils::{MockTransportFactory, RecordingObserver, TestCapture, WAIT_TIMEOUT_MS};
use seminar_client::{
    ConnectionState, PeerSnapshot, ReconnectConfig, SeminarIdentity, SeminarSession,
    SessionConfig, SessionHandle,
};
use seminar_core::{Role, SessionId};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Run the relay on an ephemeral port and return the base signaling URL.
pub async fn spawn_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = seminar_server::serve(listener).await;
    });

    format!("ws://{addr}/ws/live-stream")
}

/// A full session talking to the relay, with mock media underneath.
pub struct Participant {
    pub session: SeminarSession,
    pub transports: MockTransportFactory,
    pub observer: RecordingObserver,
    pub capture: TestCapture,
}

impl Participant {
    pub async fn join(relay: &str, username: &str, role: Role) -> Self {
        let config = SessionConfig {
            signaling_url: relay.to_owned(),
            settle_delay_ms: 10,
            reconnect: ReconnectConfig {
                base_delay_ms: 10,
                max_delay_ms: 40,
                max_attempts: 3,
            },
            ..Default::default()
        };
        let transports = MockTransportFactory::new();
        let observer = RecordingObserver::new();
        let capture = TestCapture::new();

        let session = SeminarSession::connect(
            config,
            SeminarIdentity::new("42", username, role),
            Arc::new(capture.clone()),
            Arc::new(transports.clone()),
            Arc::new(observer.clone()),
        )
        .await
        .expect("failed to join seminar");

        Self {
            session,
            transports,
            observer,
            capture,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        self.session.handle()
    }

    /// Wait until exactly `count` peers exist and all are connected.
    pub async fn wait_for_connected(&self, count: usize) -> Vec<PeerSnapshot> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(WAIT_TIMEOUT_MS);

        loop {
            let peers = self.handle().peers().await.unwrap();
            if peers.len() == count
                && peers.iter().all(|p| p.state == ConnectionState::Connected)
            {
                return peers;
            }
            if start.elapsed() > timeout {
                panic!("expected {count} connected peers, got {peers:?}");
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// Session id of the instructor, as seen from a student.
    pub async fn instructor_id(&self) -> SessionId {
        let peers = self.wait_for_connected(1).await;
        assert_eq!(peers[0].role, Some(Role::Instructor));
        peers[0].session_id.clone()
    }
}
