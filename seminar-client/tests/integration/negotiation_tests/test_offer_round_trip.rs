use seminar_client::{ConnectionState, NegotiationRole};
use seminar_core::{Role, SessionDescription, SessionId, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{ObservedEvent, WAIT_TIMEOUT_MS, create_test_session, wait_until};

#[tokio::test]
async fn test_offer_from_unknown_peer_creates_responder_and_connects() {
    init_tracing();

    let session = create_test_session(Role::Student);
    session.open();

    let instructor = SessionId::from("instructor");
    session.deliver(SignalMessage::Offer {
        target: SessionId::from("me"),
        from: Some(instructor.clone()),
        offer: SessionDescription::offer("v=0\r\nm=audio mic\r\n"),
    });

    assert!(
        session
            .wait_for_state(&instructor, ConnectionState::Connected)
            .await
    );

    let peer = session.peer(&instructor).await.unwrap();
    assert_eq!(peer.negotiation_role, NegotiationRole::Responder);
    assert_eq!(session.signaling.answers_to(&instructor).len(), 1);
    assert!(session.observer.has(&ObservedEvent::PeerState {
        peer: instructor.clone(),
        state: ConnectionState::Negotiating,
    }));
}

#[tokio::test]
async fn test_late_stream_notice_still_negotiates() {
    init_tracing();

    let session = create_test_session(Role::Student);
    session.open();
    assert!(wait_until(WAIT_TIMEOUT_MS, || session.signaling.count("join") == 1).await);

    // Nothing happens until the instructor's notice shows up.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(session.handle.peers().await.unwrap().is_empty());

    let instructor = SessionId::from("instructor");
    session.deliver(SignalMessage::InstructorStreamAvailable {
        instructor_session_id: instructor.clone(),
    });
    session.deliver(SignalMessage::Offer {
        target: SessionId::from("me"),
        from: Some(instructor.clone()),
        offer: SessionDescription::offer("v=0\r\n"),
    });

    assert!(
        session
            .wait_for_state(&instructor, ConnectionState::Connected)
            .await
    );
    let peer = session.peer(&instructor).await.unwrap();
    assert_eq!(peer.negotiation_role, NegotiationRole::Responder);
    assert_eq!(session.transports.created_for(&instructor), 1);
}

#[tokio::test]
async fn test_initiator_connects_after_answer() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();

    let student = SessionId::from("student-1");
    session.student_joined(&student, "ada");
    assert!(session.wait_for_offers(&student, 1).await);
    assert!(
        session
            .wait_for_state(&student, ConnectionState::Negotiating)
            .await
    );

    session.answer_latest_offer(&student);

    assert!(
        session
            .wait_for_state(&student, ConnectionState::Connected)
            .await
    );
    assert_eq!(session.signaling.count("answer"), 0);
}

#[tokio::test]
async fn test_ice_drop_and_recovery() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();

    let student = SessionId::from("student-1");
    session.connect_student(&student, "ada").await;
    let transport = session.transports.transport(&student).unwrap();

    transport.emit_ice(seminar_client::IceState::Disconnected);
    assert!(
        session
            .wait_for_state(&student, ConnectionState::Reconnecting)
            .await
    );

    transport.emit_ice(seminar_client::IceState::Connected);
    assert!(
        session
            .wait_for_state(&student, ConnectionState::Connected)
            .await
    );
}
