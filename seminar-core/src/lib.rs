pub mod model;
pub mod utils;

pub use model::{
    IceCandidate, IceServerConfig, Role, SdpType, SeminarId, SessionDescription, SessionId,
    SignalMessage,
};
