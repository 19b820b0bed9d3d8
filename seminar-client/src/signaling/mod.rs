mod channel;
mod channel_event;
mod signaling_output;

pub use channel::*;
pub use channel_event::*;
pub use signaling_output::*;
