mod observer;
mod orchestrator;
mod session;
mod session_command;

pub use observer::*;
pub use orchestrator::*;
pub use session::*;
pub use session_command::*;
