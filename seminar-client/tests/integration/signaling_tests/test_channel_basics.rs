use futures::{SinkExt, StreamExt};
use seminar_client::{ChannelEvent, ConnectError, SignalingChannel, SignalingOutput};
use seminar_core::{Role, SessionId, SignalMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use super::{assert_quiet, bind_local, fast_backoff, next_event};
use crate::integration::init_tracing;

#[tokio::test]
async fn test_send_on_unopened_channel_is_a_no_op() {
    init_tracing();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = SignalingChannel::new("ws://127.0.0.1:9/none", fast_backoff(3), tx);

    channel.send(SignalMessage::InstructorStreamStart);

    assert!(!channel.is_open());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_failed_handshake_is_reported() {
    init_tracing();

    let (listener, url) = bind_local().await;
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = SignalingChannel::new(url, fast_backoff(3), tx);

    let err = channel.connect().await.unwrap_err();
    assert!(matches!(err, ConnectError::Handshake { .. }));
    assert_quiet(&mut rx, 100).await;
}

#[tokio::test]
async fn test_messages_flow_both_ways() {
    init_tracing();

    let (listener, url) = bind_local().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let joined = serde_json::to_string(&SignalMessage::UserJoined {
            username: "ada".into(),
            role: Role::Student,
            session_id: SessionId::from("s-1"),
        })
        .unwrap();
        ws.send(Message::Text(joined.into())).await.unwrap();
        ws.send(Message::Text("not json".into())).await.unwrap();

        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let message = serde_json::from_str::<SignalMessage>(&text).unwrap();
                    return (message, ws);
                }
                Some(Ok(_)) => continue,
                other => panic!("socket ended early: {other:?}"),
            }
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = SignalingChannel::new(url, fast_backoff(3), tx);
    channel.connect().await.unwrap();

    assert_eq!(next_event(&mut rx).await, ChannelEvent::Opened { reconnected: false });
    assert_eq!(
        next_event(&mut rx).await,
        ChannelEvent::Message(SignalMessage::UserJoined {
            username: "ada".into(),
            role: Role::Student,
            session_id: SessionId::from("s-1"),
        })
    );

    channel.send(SignalMessage::Join {
        username: "prof".into(),
        role: Role::Instructor,
    });

    let (received, _ws) = server.await.unwrap();
    assert_eq!(
        received,
        SignalMessage::Join {
            username: "prof".into(),
            role: Role::Instructor,
        }
    );

    // The malformed frame was skipped, not surfaced.
    assert_quiet(&mut rx, 50).await;
    channel.close().await;
}

#[tokio::test]
async fn test_local_close_uses_normal_closure() {
    init_tracing();

    let (listener, url) = bind_local().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Close(frame) = msg {
                return frame.map(|f| f.code);
            }
        }
        None
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = SignalingChannel::new(url, fast_backoff(3), tx);
    channel.connect().await.unwrap();
    assert_eq!(next_event(&mut rx).await, ChannelEvent::Opened { reconnected: false });

    channel.close().await;

    assert_eq!(server.await.unwrap(), Some(CloseCode::Normal));
    assert!(matches!(
        next_event(&mut rx).await,
        ChannelEvent::Disconnected {
            code: 1000,
            fatal: false,
            ..
        }
    ));
    assert_quiet(&mut rx, 100).await;
}

#[tokio::test]
async fn test_normal_closure_from_server_does_not_reconnect() {
    init_tracing();

    let (listener, url) = bind_local().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "seminar over".into(),
        })))
        .await
        .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
        // Keep accepting so a reconnect attempt would succeed.
        let _ = listener.accept().await;
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = SignalingChannel::new(url, fast_backoff(3), tx);
    channel.connect().await.unwrap();

    assert_eq!(next_event(&mut rx).await, ChannelEvent::Opened { reconnected: false });
    assert_eq!(
        next_event(&mut rx).await,
        ChannelEvent::Disconnected {
            code: 1000,
            reason: "seminar over".into(),
            fatal: false,
        }
    );
    assert_quiet(&mut rx, 200).await;
    assert!(!channel.is_open());
}
