use seminar_client::{ConnectionState, IceState};
use seminar_core::{Role, SessionDescription, SessionId, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{ObservedEvent, WAIT_TIMEOUT_MS, create_test_session, wait_until};

#[tokio::test]
async fn test_bad_offer_sends_nothing_and_keeps_state() {
    init_tracing();

    let session = create_test_session(Role::Student);
    session.transports.fail_remote_descriptions(true);
    session.open();

    let instructor = SessionId::from("instructor");
    session.deliver(SignalMessage::Offer {
        target: SessionId::from("me"),
        from: Some(instructor.clone()),
        offer: SessionDescription::offer("garbage"),
    });

    assert!(wait_until(WAIT_TIMEOUT_MS, || session.transports.created_for(&instructor) == 1).await);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(session.signaling.answers_to(&instructor).is_empty());
    let peer = session.peer(&instructor).await.unwrap();
    assert_eq!(peer.state, ConnectionState::New);
}

#[tokio::test]
async fn test_answer_for_unknown_peer_is_dropped() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();

    session.deliver(SignalMessage::Answer {
        target: SessionId::from("me"),
        from: Some(SessionId::from("stranger")),
        answer: SessionDescription::answer("v=0\r\n"),
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(session.handle.peers().await.unwrap().is_empty());
    assert_eq!(session.transports.created_for(&SessionId::from("stranger")), 0);
}

#[tokio::test]
async fn test_ice_failure_evicts_only_that_peer() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();
    session.handle.start_microphone().await.unwrap();
    assert!(
        wait_until(WAIT_TIMEOUT_MS, || {
            session.signaling.count("instructor-stream-start") == 2
        })
        .await
    );

    let ada = SessionId::from("student-ada");
    let linus = SessionId::from("student-linus");
    session.connect_student(&ada, "ada").await;
    session.connect_student(&linus, "linus").await;

    let transport = session.transports.transport(&ada).unwrap();
    transport.emit_ice(IceState::Failed);

    assert!(session.wait_for_peer_gone(&ada).await);
    assert!(wait_until(WAIT_TIMEOUT_MS, || transport.is_closed()).await);

    let remaining = session.peer(&linus).await.unwrap();
    assert_eq!(remaining.state, ConnectionState::Connected);
    assert!(session.handle.microphone().await.is_some());
}

#[tokio::test]
async fn test_transport_creation_failure_closes_peer() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.transports.fail_creation(true);
    session.open();

    let student = SessionId::from("student-1");
    session.student_joined(&student, "ada");

    assert!(
        wait_until(WAIT_TIMEOUT_MS, || session.observer.has(&ObservedEvent::PeerState {
            peer: student.clone(),
            state: ConnectionState::Closed,
        }))
        .await
    );
    assert!(session.wait_for_peer_gone(&student).await);
    assert!(session.signaling.offers_to(&student).is_empty());
}
