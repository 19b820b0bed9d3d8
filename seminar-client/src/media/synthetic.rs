use crate::error::CaptureError;
use crate::media::{
    AudioConstraints, CapturedMedia, DisplayConstraints, LocalTrack, MediaCapture, MediaKind,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace};
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One 20 ms Opus frame of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const AUDIO_FRAME: Duration = Duration::from_millis(20);

/// Capture backend for headless participants: microphone and system audio
/// are Opus silence, the screen is a VP8 track that negotiates but carries
/// no frames.
#[derive(Default)]
pub struct SyntheticCapture {
    display_end: Mutex<Option<oneshot::Sender<()>>>,
}

impl SyntheticCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user ending the current screen share from the OS.
    /// Returns `false` if no display capture is running.
    pub fn end_display(&self) -> bool {
        let sender = self
            .display_end
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match sender {
            Some(sender) => sender.send(()).is_ok(),
            None => false,
        }
    }

    fn opus_track(constraints: &AudioConstraints, stream_id: &str) -> Arc<TrackLocalStaticSample> {
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: constraints.sample_rate,
                channels: constraints.channel_count,
                ..Default::default()
            },
            format!("audio-{}", Uuid::new_v4()),
            stream_id.to_owned(),
        ))
    }
}

#[async_trait]
impl MediaCapture for SyntheticCapture {
    async fn open_microphone(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<CapturedMedia, CaptureError> {
        let track = Self::opus_track(constraints, "seminar-microphone");
        let pump = tokio::spawn(pump_silence(track.clone()));
        debug!(track = %track.id(), "Synthetic microphone opened");

        Ok(
            CapturedMedia::new(vec![LocalTrack::new(MediaKind::Audio, track)])
                .with_release(move || pump.abort()),
        )
    }

    async fn open_display(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<CapturedMedia, CaptureError> {
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90_000,
                ..Default::default()
            },
            format!("video-{}", Uuid::new_v4()),
            "seminar-screen".to_owned(),
        ));
        let mut tracks = vec![LocalTrack::new(MediaKind::Video, video)];

        let mut pumps = Vec::new();
        if constraints.system_audio {
            let audio = Self::opus_track(&AudioConstraints::default(), "seminar-screen");
            pumps.push(tokio::spawn(pump_silence(audio.clone())));
            tracks.push(LocalTrack::new(MediaKind::Audio, audio));
        }

        let (end_tx, end_rx) = oneshot::channel();
        *self
            .display_end
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(end_tx);

        debug!(
            surface = ?constraints.surface,
            width = constraints.width,
            height = constraints.height,
            fps = constraints.max_frame_rate,
            "Synthetic display opened"
        );

        Ok(CapturedMedia::new(tracks)
            .with_ended(end_rx)
            .with_release(move || pumps.iter().for_each(|p| p.abort())))
    }
}

async fn pump_silence(track: Arc<TrackLocalStaticSample>) {
    let mut ticker = tokio::time::interval(AUDIO_FRAME);
    loop {
        ticker.tick().await;
        let sample = Sample {
            data: Bytes::from_static(&OPUS_SILENCE),
            duration: AUDIO_FRAME,
            ..Default::default()
        };
        if let Err(e) = track.write_sample(&sample).await {
            trace!("Dropping silence frame: {}", e);
        }
    }
}
