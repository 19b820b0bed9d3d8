pub use seminar_core::model::{Role, SeminarId, SessionId};

pub mod model {
    pub use seminar_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use seminar_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use seminar_client::*;
}
