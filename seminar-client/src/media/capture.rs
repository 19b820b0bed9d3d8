use crate::error::CaptureError;
use crate::media::{AudioConstraints, DisplayConstraints, LocalTrack};
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Tracks handed back by a capture backend.
pub struct CapturedMedia {
    pub tracks: Vec<LocalTrack>,
    /// Resolves when the user or the OS ends the capture.
    pub ended: Option<oneshot::Receiver<()>>,
    /// Stops the underlying device; called once when the source is released.
    pub release: Option<Box<dyn FnOnce() + Send>>,
}

impl CapturedMedia {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self {
            tracks,
            ended: None,
            release: None,
        }
    }

    pub fn with_ended(mut self, ended: oneshot::Receiver<()>) -> Self {
        self.ended = Some(ended);
        self
    }

    pub fn with_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }
}

/// Platform access to microphones and screens.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn open_microphone(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<CapturedMedia, CaptureError>;

    async fn open_display(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<CapturedMedia, CaptureError>;
}
