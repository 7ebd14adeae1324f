//! Credential submission flows end to end against the service fake

mod common;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::*;
use mentorlink_core::{Role, Route, Session, SignupRole};
use mentorlink_session::{
    CredentialSubmitter, FileKeyValueStore, NavigationHistory, Navigator, NoticeBoard, NoticeKind,
    ProviderError, RoleRouter, SessionContext, Submission, SubmitOutcome,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

struct Harness {
    api: Arc<FakeServiceApi>,
    session: SessionContext,
    history: Arc<NavigationHistory>,
    notices: NoticeBoard,
    submitter: CredentialSubmitter,
}

fn harness_with(session: SessionContext) -> Harness {
    let api = FakeServiceApi::new();
    let history = Arc::new(NavigationHistory::new());
    let notices = NoticeBoard::new();
    let submitter = CredentialSubmitter::new(
        api.clone(),
        session.clone(),
        RoleRouter::new(history.clone()),
        notices.clone(),
    );
    Harness {
        api,
        session,
        history,
        notices,
        submitter,
    }
}

fn harness() -> Harness {
    harness_with(signed_out().1)
}

fn sign_in(email: &str, password: &str) -> Submission {
    Submission::SignIn {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_mentor_sign_in_stores_session_and_navigates() {
    let h = harness();

    let outcome = h.submitter.submit(sign_in("a@x.com", "p")).await.unwrap();

    match outcome {
        SubmitOutcome::SignedIn { session, route, .. } => {
            assert_eq!(session.token, "t1");
            assert_eq!(session.user_id, "1");
            assert_eq!(session.display_name, "A");
            assert_eq!(session.role, Role::Mentor);
            assert_eq!(route, Route::MentorDashboard);
        }
        other => panic!("Expected sign-in, got {:?}", other),
    }

    let stored = h.session.read().unwrap();
    assert_eq!(stored.token, "t1");
    assert_eq!(h.history.history(), vec![Route::MentorDashboard]);
    assert!(!h.submitter.is_submitting());
}

#[tokio::test]
async fn test_each_role_routes_to_its_dashboard() {
    let cases = [
        ("student", Route::StudentDashboard),
        ("mentor", Route::MentorDashboard),
        ("subadmin", Route::SubadminDashboard),
        ("superadmin", Route::SuperadminDashboard),
        ("guest", Route::Dashboard),
    ];

    for (role, expected) in cases {
        let h = harness();
        h.api.set_auth(reply_ok(role));
        h.submitter.submit(sign_in("a@x.com", "p")).await.unwrap();
        assert_eq!(h.history.current(), Some(expected), "role {}", role);
    }
}

fn reply_ok(role: &str) -> Reply<mentorlink_api::AuthResponse> {
    Reply::Ok(auth_response("t1", "1", "A", role))
}

#[tokio::test]
async fn test_inactive_account_is_informational() {
    let h = harness();
    h.api.set_auth(status(
        403,
        "Your account is currently inactive, contact support",
    ));

    let outcome = h.submitter.submit(sign_in("a@x.com", "p")).await.unwrap();

    let notice = h.notices.current().unwrap();
    assert_eq!(notice.kind, NoticeKind::Info);
    assert_eq!(
        notice.message,
        "Your account is currently inactive, contact support"
    );
    assert_eq!(outcome, SubmitOutcome::Rejected(notice));
    assert!(h.session.read().is_none());
    assert!(h.history.history().is_empty());
}

#[tokio::test]
async fn test_near_miss_message_is_an_error() {
    let h = harness();
    h.api.set_auth(status(403, "Account inactive"));

    h.submitter.submit(sign_in("a@x.com", "p")).await.unwrap();

    let notice = h.notices.current().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "Account inactive");
    assert!(h.session.read().is_none());
}

#[tokio::test]
async fn test_invalid_input_makes_no_remote_call() {
    let h = harness();

    let outcome = h.submitter.submit(sign_in("", "p")).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Rejected(ref n) if n.kind == NoticeKind::Error));

    h.submitter.submit(sign_in("not-an-email", "p")).await.unwrap();
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_network_failure_stores_nothing() {
    let h = harness();
    h.api.set_auth(Reply::Unreachable);

    h.submitter.submit(sign_in("a@x.com", "p")).await.unwrap();

    let notice = h.notices.current().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(h.session.read().is_none());
}

#[tokio::test]
async fn test_incomplete_response_is_not_stored() {
    let h = harness();
    h.api.set_auth(Reply::Ok(auth_response("", "1", "A", "mentor")));

    let outcome = h.submitter.submit(sign_in("a@x.com", "p")).await.unwrap();

    assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
    assert!(h.session.read().is_none());
    assert!(h.history.history().is_empty());
}

#[tokio::test]
async fn test_sign_up_uses_register() {
    let h = harness();
    h.api.set_auth(reply_ok("student"));

    let outcome = h
        .submitter
        .submit(Submission::SignUp {
            email: "s@x.com".to_string(),
            password: "pw".to_string(),
            role: SignupRole::Student,
        })
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        SubmitOutcome::SignedIn {
            route: Route::StudentDashboard,
            ..
        }
    ));
    assert_eq!(h.api.calls(), vec!["register".to_string()]);
}

#[tokio::test]
async fn test_second_submission_while_in_flight_is_busy() {
    let h = harness();
    let gate = h.api.gate();

    let (first, second) = tokio::join!(h.submitter.submit(sign_in("a@x.com", "p")), async {
        let second = h.submitter.submit(sign_in("a@x.com", "p")).await;
        gate.notify_one();
        second
    });

    assert!(matches!(first.unwrap(), SubmitOutcome::SignedIn { .. }));
    assert_eq!(second.unwrap(), SubmitOutcome::Busy);
    assert_eq!(h.api.count("login"), 1);
}

#[tokio::test]
async fn test_identity_provider_error_makes_no_call() {
    let h = harness();

    let outcome = h
        .submitter
        .submit_identity_token(Err(ProviderError::Cancelled))
        .await
        .unwrap();

    assert!(matches!(outcome, SubmitOutcome::Rejected(ref n) if n.kind == NoticeKind::Error));
    assert!(h.api.calls().is_empty());
    assert!(h.session.read().is_none());
}

#[tokio::test]
async fn test_identity_token_is_forwarded_untouched() {
    let h = harness();
    h.api.set_auth(reply_ok("superadmin"));
    let token = format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
        URL_SAFE_NO_PAD.encode(r#"{"name":"Ada","picture":"https://img/a.png"}"#)
    );

    let outcome = h
        .submitter
        .submit_identity_token(Ok(token.clone()))
        .await
        .unwrap();

    match outcome {
        SubmitOutcome::SignedIn {
            route, identity, ..
        } => {
            assert_eq!(route, Route::SuperadminDashboard);
            assert_eq!(identity.unwrap().name.as_deref(), Some("Ada"));
        }
        other => panic!("Expected sign-in, got {:?}", other),
    }
    assert_eq!(h.api.last_google_token.lock().unwrap().as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn test_opaque_identity_token_still_signs_in() {
    let h = harness();

    let outcome = h
        .submitter
        .submit_identity_token(Ok("opaque-token".to_string()))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        SubmitOutcome::SignedIn { identity: None, .. }
    ));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    {
        let backend = Arc::new(FileKeyValueStore::open(temp_dir.path()).unwrap());
        let h = harness_with(SessionContext::open(backend).unwrap());
        h.submitter.submit(sign_in("a@x.com", "p")).await.unwrap();
    }

    let backend = Arc::new(FileKeyValueStore::open(temp_dir.path()).unwrap());
    let session = SessionContext::open(backend).unwrap().read().unwrap();
    assert_eq!(session.token, "t1");
    assert_eq!(session.role, Role::Mentor);
}

/// Records what the session store held at the moment of each navigation
struct SessionAtNavigation {
    session: SessionContext,
    seen: Mutex<Vec<(Route, Option<Session>)>>,
}

impl Navigator for SessionAtNavigation {
    fn navigate(&self, route: Route) {
        self.seen.lock().unwrap().push((route, self.session.read()));
    }
}

#[tokio::test]
async fn test_session_is_stored_before_navigation() {
    let (_, session) = signed_out();
    let navigator = Arc::new(SessionAtNavigation {
        session: session.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let submitter = CredentialSubmitter::new(
        FakeServiceApi::new(),
        session,
        RoleRouter::new(navigator.clone()),
        NoticeBoard::new(),
    );

    submitter.submit(sign_in("a@x.com", "p")).await.unwrap();

    let seen = navigator.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (route, stored) = &seen[0];
    assert_eq!(*route, Route::MentorDashboard);
    assert_eq!(stored.as_ref().map(|s| s.token.as_str()), Some("t1"));
}

