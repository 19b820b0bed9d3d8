use seminar_core::Role;
use thiserror::Error;

/// Failure to open the signaling socket.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("signaling handshake with {url} failed: {source}")]
    Handshake {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
}

/// Failure to acquire a local capture source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission to capture was denied")]
    PermissionDenied,

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("capture request was cancelled")]
    Cancelled,

    #[error("capture backend error: {0}")]
    Backend(String),
}

/// Failure of an action requested through a session handle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{action} is not permitted for role {role}")]
    NotPermitted { action: &'static str, role: Role },

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("session has already ended")]
    Closed,
}
