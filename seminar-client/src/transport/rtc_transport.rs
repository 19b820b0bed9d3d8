use crate::media::{LocalTrack, MediaKind};
use crate::transport::{
    IceState, MediaTransport, RemoteTrack, TransportConfig, TransportEvent, TransportFactory,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use seminar_core::{IceCandidate, SdpType, SessionDescription, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// [`MediaTransport`] backed by a webrtc-rs peer connection.
pub struct RtcTransport {
    session_id: SessionId,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<HashMap<String, (MediaKind, Arc<RTCRtpSender>)>>,
}

impl RtcTransport {
    /// `events` receives ICE state changes, local candidates and remote
    /// tracks, tagged with `session_id`.
    pub async fn new(
        session_id: SessionId,
        config: &TransportConfig,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ice_candidate_pool_size: config.ice_candidate_pool_size,
            bundle_policy: RTCBundlePolicy::MaxBundle,
            rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = events.clone();
        let sid_state = session_id.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = state_tx.clone();
                let sid = sid_state.clone();

                Box::pin(async move {
                    info!(session_id = %sid, state = %s, "ICE connection state changed");
                    let Some(state) = IceState::from_rtc(s) else {
                        return;
                    };
                    let _ = tx.send(TransportEvent::IceStateChanged(sid, state));
                })
            },
        ));

        let ice_tx = events.clone();
        let sid_ice = session_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let sid = sid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx.send(TransportEvent::CandidateGenerated(sid, candidate));
            })
        }));

        let track_tx = events;
        let sid_track = session_id.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let sid = sid_track.clone();

                Box::pin(async move {
                    let remote = RemoteTrack {
                        track_id: track.id(),
                        stream_id: track.stream_id(),
                        kind: MediaKind::from_codec_type(track.kind()),
                        track: Some(track),
                    };
                    debug!(session_id = %sid, track = %remote.track_id, "Remote track arrived");
                    let _ = tx.send(TransportEvent::TrackReceived(sid, remote));
                })
            },
        ));

        Ok(Self {
            session_id,
            peer_connection,
            senders: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl MediaTransport for RtcTransport {
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
            SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
            SdpType::Rollback => bail!("rollback descriptions are not supported"),
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        let mut senders = self.senders.lock().await;
        if senders.contains_key(&track.id) {
            bail!("track {} is already attached", track.id);
        }

        let sender = self.peer_connection.add_track(track.track.clone()).await?;

        // RTCP has to be drained for the interceptors to work.
        let rtcp_sender = sender.clone();
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        debug!(session_id = %self.session_id, track = %track.id, "Track attached");
        senders.insert(track.id.clone(), (track.kind, sender));
        Ok(())
    }

    async fn remove_track(&self, track_id: &str) -> Result<()> {
        let Some((_, sender)) = self.senders.lock().await.remove(track_id) else {
            warn!(session_id = %self.session_id, track = track_id, "Track not attached");
            return Ok(());
        };
        self.peer_connection.remove_track(&sender).await?;
        debug!(session_id = %self.session_id, track = track_id, "Track detached");
        Ok(())
    }

    async fn outbound_tracks(&self) -> Vec<(String, MediaKind)> {
        self.senders
            .lock()
            .await
            .iter()
            .map(|(id, (kind, _))| (id.clone(), *kind))
            .collect()
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Builds an [`RtcTransport`] per remote participant.
#[derive(Debug, Clone, Default)]
pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        session_id: &SessionId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>> {
        let transport = RtcTransport::new(session_id.clone(), &self.config, events).await?;
        Ok(Arc::new(transport))
    }
}
