use seminar_core::{Role, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_relay};

fn is_available(message: &SignalMessage) -> bool {
    matches!(message, SignalMessage::InstructorStreamAvailable { .. })
}

#[tokio::test]
async fn test_instructor_stream_is_announced() {
    init_tracing();
    let relay = spawn_relay().await;

    let mut prof = TestClient::join(&relay, "42", "prof", Role::Instructor).await;
    let mut ada = TestClient::join(&relay, "42", "ada", Role::Student).await;
    prof.next().await;

    prof.send(&SignalMessage::InstructorStreamStart).await;

    let prof_id = match ada.next_matching(|m| matches!(m, SignalMessage::UserJoined { .. })).await {
        SignalMessage::UserJoined { session_id, .. } => session_id,
        _ => unreachable!(),
    };
    assert_eq!(
        ada.next_matching(is_available).await,
        SignalMessage::InstructorStreamAvailable {
            instructor_session_id: prof_id,
        }
    );
}

#[tokio::test]
async fn test_students_cannot_announce() {
    init_tracing();
    let relay = spawn_relay().await;

    let mut ada = TestClient::join(&relay, "42", "ada", Role::Student).await;
    let mut bob = TestClient::join(&relay, "42", "bob", Role::Student).await;
    ada.next().await;
    bob.next().await;

    ada.send(&SignalMessage::InstructorStreamStart).await;
    ada.send(&SignalMessage::ScreenShareStart).await;

    bob.assert_quiet(200).await;
}

#[tokio::test]
async fn test_screen_share_is_relayed_and_replayed() {
    init_tracing();
    let relay = spawn_relay().await;

    let mut prof = TestClient::join(&relay, "42", "prof", Role::Instructor).await;
    let mut ada = TestClient::join(&relay, "42", "ada", Role::Student).await;
    prof.next().await;

    prof.send(&SignalMessage::InstructorStreamStart).await;
    prof.send(&SignalMessage::ScreenShareStart).await;
    assert_eq!(
        ada.next_matching(|m| *m == SignalMessage::ScreenShareStart).await,
        SignalMessage::ScreenShareStart
    );

    // A student arriving mid-share learns about both.
    let mut bob = TestClient::join(&relay, "42", "bob", Role::Student).await;
    bob.next_matching(is_available).await;
    bob.next_matching(|m| *m == SignalMessage::ScreenShareStart).await;

    prof.send(&SignalMessage::ScreenShareStop).await;
    ada.next_matching(|m| *m == SignalMessage::ScreenShareStop).await;
    bob.next_matching(|m| *m == SignalMessage::ScreenShareStop).await;
}

#[tokio::test]
async fn test_room_is_dropped_when_empty() {
    init_tracing();
    let relay = spawn_relay().await;

    let mut prof = TestClient::join(&relay, "42", "prof", Role::Instructor).await;
    prof.send(&SignalMessage::InstructorStreamStart).await;
    prof.assert_quiet(100).await;
    prof.close().await;
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let mut ada = TestClient::join(&relay, "42", "ada", Role::Student).await;
    ada.assert_quiet(300).await;
}
