mod test_channel_basics;

use seminar_client::{ChannelEvent, ReconnectConfig};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub fn fast_backoff(max_attempts: u32) -> ReconnectConfig {
    ReconnectConfig {
        base_delay_ms: 10,
        max_delay_ms: 40,
        max_attempts,
    }
}

pub async fn bind_local() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/live-stream/42", listener.local_addr().unwrap());
    (listener, url)
}

/// Next channel event, failing the test after two seconds.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("channel event stream ended")
}

/// Assert nothing else is emitted within `ms`.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>, ms: u64) {
    if let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(ms), rx.recv()).await {
        panic!("unexpected channel event: {event:?}");
    }
}
