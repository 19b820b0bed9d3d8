use crate::room::RoomManager;
use crate::signaling::ws_handler;
use axum::Router;
use axum::routing::get;
use seminar_core::utils::LIVE_STREAM_PATH;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state of the relay's HTTP router.
#[derive(Clone, Default)]
pub struct SignalingService {
    rooms: RoomManager,
}

impl SignalingService {
    pub fn new(rooms: RoomManager) -> Self {
        Self { rooms }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// `GET {LIVE_STREAM_PATH}/{seminar_id}` upgrades to the seminar socket.
    pub fn router(self) -> Router {
        Router::new()
            .route(&format!("{LIVE_STREAM_PATH}/{{seminar_id}}"), get(ws_handler))
            .with_state(self)
    }
}

/// Router with a fresh, empty set of rooms.
pub fn router() -> Router {
    SignalingService::default().router()
}

/// Serve the relay on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Seminar relay listening on {}", addr);
    }
    axum::serve(listener, router()).await
}
