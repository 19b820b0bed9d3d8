use crate::media::{LocalTrack, MediaKind};
use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use seminar_core::{IceCandidate, SessionDescription, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One media connection toward one remote participant.
///
/// `create_offer` and `create_answer` also install the result as the local
/// description.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn add_track(&self, track: &LocalTrack) -> Result<()>;

    async fn remove_track(&self, track_id: &str) -> Result<()>;

    /// Ids and kinds of the tracks currently attached as senders.
    async fn outbound_tracks(&self) -> Vec<(String, MediaKind)>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        session_id: &SessionId,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>>;
}
