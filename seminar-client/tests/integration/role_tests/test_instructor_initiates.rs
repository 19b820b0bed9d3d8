use seminar_client::NegotiationRole;
use seminar_core::{Role, SessionId, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{WAIT_TIMEOUT_MS, create_test_session, wait_until};

#[tokio::test]
async fn test_open_sends_join_then_stream_announcement() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();

    assert!(wait_until(WAIT_TIMEOUT_MS, || session.signaling.sent().len() >= 2).await);
    assert_eq!(
        session.signaling.sent(),
        vec![
            SignalMessage::Join {
                username: "prof".into(),
                role: Role::Instructor,
            },
            SignalMessage::InstructorStreamStart,
        ]
    );
}

#[tokio::test]
async fn test_instructor_offers_each_student_exactly_once() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();

    let student = SessionId::from("student-1");
    session.student_joined(&student, "ada");
    session.student_joined(&student, "ada");

    assert!(session.wait_for_offers(&student, 1).await);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(session.signaling.offers_to(&student).len(), 1);

    let peer = session.peer(&student).await.expect("peer missing");
    assert_eq!(peer.negotiation_role, NegotiationRole::Initiator);
    assert_eq!(peer.username.as_deref(), Some("ada"));
    assert_eq!(peer.role, Some(Role::Student));
    assert_eq!(session.transports.created_for(&student), 1);
}

#[tokio::test]
async fn test_instructor_does_not_offer_to_other_instructors() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();

    let other = SessionId::from("co-teacher");
    session.deliver(SignalMessage::UserJoined {
        username: "grace".into(),
        role: Role::Instructor,
        session_id: other.clone(),
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(session.signaling.offers_to(&other).is_empty());
    assert!(session.peer(&other).await.is_none());
}
