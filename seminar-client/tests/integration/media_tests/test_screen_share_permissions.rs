use seminar_client::{CaptureError, DisplaySurface, SessionError};
use seminar_core::{Role, SessionId};

use crate::integration::init_tracing;
use crate::utils::create_test_session;

#[tokio::test]
async fn test_student_cannot_share_screen() {
    init_tracing();

    let session = create_test_session(Role::Student);
    session.open();

    let err = session
        .handle
        .start_screen_share(DisplaySurface::Monitor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::NotPermitted {
            role: Role::Student,
            ..
        }
    ));

    let err = session.handle.stop_screen_share().await.unwrap_err();
    assert!(matches!(err, SessionError::NotPermitted { .. }));
    assert!(session.handle.screen().await.is_none());
}

#[tokio::test]
async fn test_denied_capture_is_reported_and_changes_nothing() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session.open();

    let student = SessionId::from("student-a");
    session.connect_student(&student, "ada").await;

    session
        .capture
        .fail_display(Some(CaptureError::PermissionDenied));
    let err = session
        .handle
        .start_screen_share(DisplaySurface::Monitor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Capture(CaptureError::PermissionDenied)
    ));

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(session.signaling.count("screen-share-start"), 0);
    assert_eq!(session.signaling.offers_to(&student).len(), 1);
    assert!(session.handle.screen().await.is_none());
}

#[tokio::test]
async fn test_microphone_failure_is_typed() {
    init_tracing();

    let session = create_test_session(Role::Instructor);
    session
        .capture
        .fail_microphone(Some(CaptureError::DeviceUnavailable("no input".into())));

    let err = session.handle.start_microphone().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Capture(CaptureError::DeviceUnavailable(_))
    ));
    assert!(session.handle.microphone().await.is_none());
}
