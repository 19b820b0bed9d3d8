use async_trait::async_trait;
use seminar_core::SignalMessage;

/// Outbound half of the signaling transport, as seen by the orchestrator and
/// the peer tasks.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue a message for the relay. Never blocks and never fails loudly:
    /// a closed channel logs and drops the message.
    fn send(&self, message: SignalMessage);

    /// Intentionally close the transport (normal closure, no reconnect).
    async fn close(&self);
}
