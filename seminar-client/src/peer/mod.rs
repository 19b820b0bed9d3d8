mod peer_command;
mod peer_connection;
mod peer_manager;
mod state;

pub use peer_command::*;
pub use peer_connection::*;
pub use peer_manager::*;
pub use state::*;
