use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::media::{DisplaySurface, MediaCapture, MediaSource, MediaSourceController};
use crate::orchestrator::{Orchestrator, PeerSnapshot, SessionCommand, SessionObserver};
use crate::session::{PeerRecord, SeminarIdentity};
use crate::signaling::SignalingChannel;
use crate::transport::{RtcTransportFactory, TransportFactory};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

/// Cloneable control surface of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    media: Arc<MediaSourceController>,
    identity: SeminarIdentity,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<SessionCommand>,
        media: Arc<MediaSourceController>,
        identity: SeminarIdentity,
    ) -> Self {
        Self {
            commands,
            media,
            identity,
        }
    }

    pub fn identity(&self) -> &SeminarIdentity {
        &self.identity
    }

    pub async fn start_microphone(&self) -> Result<MediaSource, SessionError> {
        self.ensure_running()?;
        Ok(self.media.start_microphone().await?)
    }

    /// Returns `false` when the microphone was not running.
    pub async fn stop_microphone(&self) -> bool {
        self.media.stop_microphone().await
    }

    /// Only the instructor may share a screen.
    pub async fn start_screen_share(
        &self,
        surface: DisplaySurface,
    ) -> Result<MediaSource, SessionError> {
        self.ensure_instructor("screen share")?;
        self.ensure_running()?;
        Ok(self.media.start_screen_capture(surface).await?)
    }

    /// Returns `false` when nothing was being shared.
    pub async fn stop_screen_share(&self) -> Result<bool, SessionError> {
        self.ensure_instructor("screen share")?;
        Ok(self.media.stop_screen_capture().await)
    }

    pub async fn microphone(&self) -> Option<MediaSource> {
        self.media.microphone().await
    }

    pub async fn screen(&self) -> Option<MediaSource> {
        self.media.screen().await
    }

    pub async fn peers(&self) -> Result<Vec<PeerSnapshot>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Peers(tx))
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Remote participants this side peers with, as named on the channel.
    pub async fn participants(&self) -> Result<Vec<PeerRecord>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Participants(tx))
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Close all peers, stop local media, then close signaling.
    pub async fn leave(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Shutdown(tx))
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    fn ensure_instructor(&self, action: &'static str) -> Result<(), SessionError> {
        if self.identity.is_instructor() {
            return Ok(());
        }
        Err(SessionError::NotPermitted {
            action,
            role: self.identity.role,
        })
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        if self.commands.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}

/// A joined seminar: the signaling channel plus the running session loop.
pub struct SeminarSession {
    handle: SessionHandle,
    task: JoinHandle<()>,
}

impl SeminarSession {
    /// Open the signaling channel and start the session loop. Joining the
    /// room happens as soon as the channel reports itself open.
    pub async fn connect(
        config: SessionConfig,
        identity: SeminarIdentity,
        capture: Arc<dyn MediaCapture>,
        transports: Arc<dyn TransportFactory>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, SessionError> {
        let url = config.endpoint(&identity.seminar_id);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let channel = Arc::new(SignalingChannel::new(
            url,
            config.reconnect.clone(),
            events_tx,
        ));
        channel.connect().await?;

        info!(
            seminar = %identity.seminar_id,
            url = channel.url(),
            "Connected to seminar signaling"
        );

        let (orchestrator, handle) = Orchestrator::new(
            identity,
            config,
            channel,
            events_rx,
            capture,
            transports,
            observer,
        );
        let task = tokio::spawn(orchestrator.run());

        Ok(Self { handle, task })
    }

    /// [`connect`](Self::connect) with webrtc-rs transports built from
    /// `config.transport`.
    pub async fn connect_rtc(
        config: SessionConfig,
        identity: SeminarIdentity,
        capture: Arc<dyn MediaCapture>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, SessionError> {
        let transports = Arc::new(RtcTransportFactory::new(config.transport.clone()));
        Self::connect(config, identity, capture, transports, observer).await
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub async fn leave(self) -> Result<(), SessionError> {
        let result = self.handle.leave().await;
        let _ = self.task.await;
        result
    }
}
