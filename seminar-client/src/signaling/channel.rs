use crate::config::ReconnectConfig;
use crate::error::ConnectError;
use crate::signaling::{ChannelEvent, SignalingOutput};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use seminar_core::SignalMessage;
use seminar_core::utils::{ABNORMAL_CLOSURE, NO_STATUS_RECEIVED, NORMAL_CLOSURE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct ChannelShared {
    writer: Mutex<Option<mpsc::UnboundedSender<WsMessage>>>,
    closing: AtomicBool,
}

impl ChannelShared {
    fn install_writer(&self) -> mpsc::UnboundedReceiver<WsMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.writer) = Some(tx);
        rx
    }

    fn clear_writer(&self) {
        lock(&self.writer).take();
    }

    fn writer(&self) -> Option<mpsc::UnboundedSender<WsMessage>> {
        lock(&self.writer).clone()
    }

    fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }
}

/// One WebSocket per seminar with bounded exponential-backoff reconnects.
///
/// Inbound messages and lifecycle changes are delivered as [`ChannelEvent`]s
/// on the sender handed to [`SignalingChannel::new`].
pub struct SignalingChannel {
    url: String,
    reconnect: ReconnectConfig,
    events: mpsc::UnboundedSender<ChannelEvent>,
    shared: Arc<ChannelShared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SignalingChannel {
    pub fn new(
        url: impl Into<String>,
        reconnect: ReconnectConfig,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        Self {
            url: url.into(),
            reconnect,
            events,
            shared: Arc::new(ChannelShared {
                writer: Mutex::new(None),
                closing: AtomicBool::new(false),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        lock(&self.shared.writer).is_some()
    }

    /// Open the socket. Fails without scheduling retries when the first
    /// handshake does not succeed; retries only cover drops of an open socket.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let previous = lock(&self.task).take();
        if let Some(task) = previous {
            task.abort();
        }
        self.shared.closing.store(false, Ordering::SeqCst);

        info!(url = %self.url, "Connecting signaling channel");
        let (stream, _) =
            connect_async(self.url.as_str())
                .await
                .map_err(|source| ConnectError::Handshake {
                    url: self.url.clone(),
                    source,
                })?;

        let outbound = self.shared.install_writer();
        let _ = self.events.send(ChannelEvent::Opened { reconnected: false });

        let link = ChannelLink {
            url: self.url.clone(),
            reconnect: self.reconnect.clone(),
            events: self.events.clone(),
            shared: self.shared.clone(),
        };
        *lock(&self.task) = Some(tokio::spawn(link.run(stream, outbound)));

        Ok(())
    }
}

#[async_trait]
impl SignalingOutput for SignalingChannel {
    fn send(&self, message: SignalMessage) {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!(kind = message.kind(), "Failed to serialize signal message: {}", e);
                return;
            }
        };

        let Some(writer) = self.shared.writer() else {
            error!(kind = message.kind(), "Signaling channel not open, dropping message");
            return;
        };

        if writer.send(WsMessage::Text(json.into())).is_err() {
            error!(kind = message.kind(), "Signaling writer gone, dropping message");
        } else {
            debug!(kind = message.kind(), "Signal queued");
        }
    }

    async fn close(&self) {
        self.shared.closing.store(true, Ordering::SeqCst);

        if let Some(writer) = lock(&self.shared.writer).take() {
            let _ = writer.send(WsMessage::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "session ended".into(),
            })));
        }

        let task = lock(&self.task).take();
        let Some(mut task) = task else {
            return;
        };
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await.is_err() {
            warn!("Signaling channel did not close in time, aborting");
            task.abort();
        }
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.shared.closing.store(true, Ordering::SeqCst);
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

/// State owned by the background connection task.
struct ChannelLink {
    url: String,
    reconnect: ReconnectConfig,
    events: mpsc::UnboundedSender<ChannelEvent>,
    shared: Arc<ChannelShared>,
}

impl ChannelLink {
    fn emit(&self, event: ChannelEvent) {
        let _ = self.events.send(event);
    }

    async fn run(self, stream: WsStream, outbound: mpsc::UnboundedReceiver<WsMessage>) {
        let mut stream = stream;
        let mut outbound = outbound;
        let mut attempt: u32 = 0;

        loop {
            let (code, reason) = self.pump(stream, outbound).await;
            self.shared.clear_writer();

            if self.shared.is_closing() || code == NORMAL_CLOSURE {
                info!(code, %reason, "Signaling channel closed");
                self.emit(ChannelEvent::Disconnected {
                    code,
                    reason,
                    fatal: false,
                });
                return;
            }

            warn!(code, %reason, "Signaling channel dropped unexpectedly");
            self.emit(ChannelEvent::Disconnected {
                code,
                reason: reason.clone(),
                fatal: false,
            });

            let (mut last_code, mut last_reason) = (code, reason);
            let reopened = loop {
                if attempt >= self.reconnect.max_attempts {
                    error!(attempts = attempt, "Reconnect attempts exhausted, giving up");
                    self.emit(ChannelEvent::Disconnected {
                        code: last_code,
                        reason: last_reason,
                        fatal: true,
                    });
                    return;
                }

                let delay = self.reconnect.delay_for(attempt);
                attempt += 1;
                info!(attempt, ?delay, "Scheduling signaling reconnect");
                self.emit(ChannelEvent::Reconnecting { attempt, delay });

                tokio::time::sleep(delay).await;
                if self.shared.is_closing() {
                    return;
                }

                match connect_async(self.url.as_str()).await {
                    Ok((stream, _)) => break stream,
                    Err(e) => {
                        warn!(attempt, "Reconnect failed: {}", e);
                        last_code = ABNORMAL_CLOSURE;
                        last_reason = e.to_string();
                    }
                }
            };

            attempt = 0;
            stream = reopened;
            outbound = self.shared.install_writer();
            info!(url = %self.url, "Signaling channel reopened");
            self.emit(ChannelEvent::Opened { reconnected: true });
        }
    }

    /// Shuttle frames until the socket closes; returns the close code and reason.
    async fn pump(
        &self,
        stream: WsStream,
        mut outbound: mpsc::UnboundedReceiver<WsMessage>,
    ) -> (u16, String) {
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                queued = outbound.recv() => {
                    let Some(msg) = queued else {
                        let _ = sink.close().await;
                        return (NORMAL_CLOSURE, "closed locally".to_owned());
                    };
                    if let Err(e) = sink.send(msg).await {
                        return (ABNORMAL_CLOSURE, e.to_string());
                    }
                }

                incoming = source.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<SignalMessage>(&text) {
                            Ok(message) => {
                                debug!(kind = message.kind(), "Signal received");
                                self.emit(ChannelEvent::Message(message));
                            }
                            Err(e) => warn!("Invalid signal message: {}", e),
                        }
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        return match frame {
                            Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_owned()),
                            None => (NO_STATUS_RECEIVED, String::new()),
                        };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return (ABNORMAL_CLOSURE, e.to_string()),
                    None => return (ABNORMAL_CLOSURE, "connection reset".to_owned()),
                },
            }
        }
    }
}
