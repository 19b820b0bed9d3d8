use crate::{RoomCommand, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use seminar_core::{SeminarId, SessionId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(seminar_id): Path<String>,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let seminar_id = SeminarId::from(seminar_id);

    ws.on_upgrade(move |socket| handle_socket(socket, seminar_id, service))
}

async fn handle_socket(socket: WebSocket, seminar_id: SeminarId, service: SignalingService) {
    let session_id = SessionId::new();
    info!(seminar = %seminar_id, session_id = %session_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let room = service.rooms().enter(&seminar_id);
    let connect = RoomCommand::Connect {
        session_id: session_id.clone(),
        tx,
    };
    if let Err(e) = room.send(connect).await {
        error!("Room died: {}", e);
        service.rooms().leave(&seminar_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let room = room.clone();
        let session_id = session_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(message) => {
                            let cmd = RoomCommand::Signal {
                                session_id: session_id.clone(),
                                message,
                            };
                            if let Err(e) = room.send(cmd).await {
                                error!("Room died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid SignalMessage from {}: {:?}", session_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    let _ = room
        .send(RoomCommand::Disconnect {
            session_id: session_id.clone(),
        })
        .await;
    drop(room);
    service.rooms().leave(&seminar_id);

    info!(seminar = %seminar_id, session_id = %session_id, "WebSocket disconnected");
}
