use crate::error::CaptureError;
use crate::media::{
    AudioConstraints, CapturedMedia, DisplayConstraints, DisplaySurface, LocalTrack, MediaCapture,
    MediaKind, MediaSource, SourceKind,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Started(SourceKind),
    Stopped(SourceKind),
}

struct ActiveSource {
    source: MediaSource,
    generation: u64,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ActiveSource {
    fn release(mut self) {
        debug!(kind = %self.source.kind, tracks = ?self.source.track_ids(), "Releasing media source");
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[derive(Default)]
struct Sources {
    microphone: Option<ActiveSource>,
    screen: Option<ActiveSource>,
}

/// Owns the local microphone and screen sources.
///
/// Every start and stop is reported on the [`MediaEvent`] channel returned
/// from [`MediaSourceController::new`]; consumers only read the tracks.
pub struct MediaSourceController {
    capture: Arc<dyn MediaCapture>,
    audio: AudioConstraints,
    display: DisplayConstraints,
    sources: Mutex<Sources>,
    events: mpsc::UnboundedSender<MediaEvent>,
    generation: AtomicU64,
}

impl MediaSourceController {
    pub fn new(
        capture: Arc<dyn MediaCapture>,
        audio: AudioConstraints,
        display: DisplayConstraints,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<MediaEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();

        let controller = Arc::new(Self {
            capture,
            audio,
            display,
            sources: Mutex::new(Sources::default()),
            events,
            generation: AtomicU64::new(0),
        });

        (controller, events_rx)
    }

    /// Start the microphone, or return it if it is already running.
    pub async fn start_microphone(&self) -> Result<MediaSource, CaptureError> {
        if let Some(active) = &self.sources.lock().await.microphone {
            return Ok(active.source.clone());
        }

        let captured = self.capture.open_microphone(&self.audio).await?;
        let (active, _) = self.activate(SourceKind::Microphone, captured);
        let source = active.source.clone();

        let mut sources = self.sources.lock().await;
        if let Some(existing) = &sources.microphone {
            // Lost a race with a concurrent start; keep the first one.
            let source = existing.source.clone();
            drop(sources);
            active.release();
            return Ok(source);
        }
        sources.microphone = Some(active);
        drop(sources);

        info!(tracks = ?source.track_ids(), "Microphone started");
        let _ = self.events.send(MediaEvent::Started(SourceKind::Microphone));
        Ok(source)
    }

    /// Replace the screen source with a fresh capture of `surface`.
    ///
    /// A previous screen source is released before the new one is requested.
    /// If the request then fails or is dropped, a `Stopped(Screen)` event is
    /// emitted so peers fall back to the remaining sources.
    pub async fn start_screen_capture(
        self: &Arc<Self>,
        surface: DisplaySurface,
    ) -> Result<MediaSource, CaptureError> {
        let previous = self.sources.lock().await.screen.take();
        let mut guard = StopOnDrop {
            events: &self.events,
            armed: previous.is_some(),
        };
        if let Some(previous) = previous {
            previous.release();
        }

        let constraints = self.display.for_surface(surface);
        let captured = self.capture.open_display(&constraints).await?;
        let (active, ended) = self.activate(SourceKind::Screen, captured);
        let source = active.source.clone();
        let generation = active.generation;

        if let Some(replaced) = self.sources.lock().await.screen.replace(active) {
            replaced.release();
        }
        guard.armed = false;

        if let Some(ended) = ended {
            let controller = Arc::downgrade(self);
            tokio::spawn(watch_capture_end(controller, generation, ended));
        }

        info!(?surface, tracks = ?source.track_ids(), "Screen capture started");
        let _ = self.events.send(MediaEvent::Started(SourceKind::Screen));
        Ok(source)
    }

    /// Returns `false` when no screen capture was active.
    pub async fn stop_screen_capture(&self) -> bool {
        let Some(active) = self.sources.lock().await.screen.take() else {
            return false;
        };

        active.release();
        info!("Screen capture stopped");
        let _ = self.events.send(MediaEvent::Stopped(SourceKind::Screen));
        true
    }

    pub async fn stop_microphone(&self) -> bool {
        let Some(active) = self.sources.lock().await.microphone.take() else {
            return false;
        };

        active.release();
        info!("Microphone stopped");
        let _ = self.events.send(MediaEvent::Stopped(SourceKind::Microphone));
        true
    }

    /// Release everything without notifying; used on session exit.
    pub async fn stop_all(&self) {
        let mut sources = self.sources.lock().await;
        let microphone = sources.microphone.take();
        let screen = sources.screen.take();
        drop(sources);

        for active in [microphone, screen].into_iter().flatten() {
            active.release();
        }
    }

    pub async fn microphone(&self) -> Option<MediaSource> {
        let sources = self.sources.lock().await;
        sources.microphone.as_ref().map(|a| a.source.clone())
    }

    pub async fn screen(&self) -> Option<MediaSource> {
        let sources = self.sources.lock().await;
        sources.screen.as_ref().map(|a| a.source.clone())
    }

    /// Tracks every peer should currently be sending. Screen video supersedes
    /// any other video, so at most one video track is returned.
    pub async fn outbound_tracks(&self) -> Vec<LocalTrack> {
        let sources = self.sources.lock().await;
        let screen_video = sources
            .screen
            .as_ref()
            .is_some_and(|a| a.source.has_video());

        let mut tracks = Vec::new();
        let mut has_video = false;

        for active in [&sources.microphone, &sources.screen].into_iter().flatten() {
            for track in &active.source.tracks {
                if track.kind == MediaKind::Video {
                    if has_video || (screen_video && active.source.kind != SourceKind::Screen) {
                        continue;
                    }
                    has_video = true;
                }
                tracks.push(track.clone());
            }
        }

        tracks
    }

    fn activate(
        &self,
        kind: SourceKind,
        captured: CapturedMedia,
    ) -> (ActiveSource, Option<tokio::sync::oneshot::Receiver<()>>) {
        let CapturedMedia {
            mut tracks,
            ended,
            release,
        } = captured;

        if kind == SourceKind::Microphone {
            let before = tracks.len();
            tracks.retain(|t| t.kind == MediaKind::Audio);
            if tracks.len() != before {
                warn!("Dropped non-audio tracks from microphone capture");
            }
        }

        let active = ActiveSource {
            source: MediaSource { kind, tracks },
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            release,
        };
        (active, ended)
    }

    async fn stop_screen_generation(&self, generation: u64) {
        let mut sources = self.sources.lock().await;
        if sources.screen.as_ref().map(|a| a.generation) != Some(generation) {
            return;
        }
        let Some(active) = sources.screen.take() else {
            return;
        };
        drop(sources);

        active.release();
        info!("Screen capture ended by the user or the system");
        let _ = self.events.send(MediaEvent::Stopped(SourceKind::Screen));
    }
}

async fn watch_capture_end(
    controller: Weak<MediaSourceController>,
    generation: u64,
    ended: tokio::sync::oneshot::Receiver<()>,
) {
    if ended.await.is_err() {
        return;
    }
    let Some(controller) = controller.upgrade() else {
        return;
    };
    controller.stop_screen_generation(generation).await;
}

/// Reports the loss of the previous screen source if a replacement never lands.
struct StopOnDrop<'a> {
    events: &'a mpsc::UnboundedSender<MediaEvent>,
    armed: bool,
}

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.events.send(MediaEvent::Stopped(SourceKind::Screen));
        }
    }
}
