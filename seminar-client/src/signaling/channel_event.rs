use seminar_core::SignalMessage;
use std::time::Duration;

/// Events the signaling channel reports to its single registered handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The socket is open. `reconnected` is set when it replaced a dropped one.
    Opened { reconnected: bool },

    Message(SignalMessage),

    /// A reconnect was scheduled; `attempt` counts from 1.
    Reconnecting { attempt: u32, delay: Duration },

    /// The socket closed. `fatal` is set once retries are exhausted.
    Disconnected {
        code: u16,
        reason: String,
        fatal: bool,
    },
}
