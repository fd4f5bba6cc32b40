//! Session context driven by real credential checks.

mod common;

use common::spawn_service;
use finledger::services::{AuthError, CredentialService, Session, SessionState};

#[tokio::test]
async fn login_then_logout() {
    let ctx = spawn_service().await;
    let alice = ctx.service.create_user("alice", "pw1").await.unwrap();

    let mut session = Session::anonymous();
    let identity = session
        .login(&ctx.service, "alice", "pw1", &alice.secret_key)
        .await
        .unwrap();

    assert!(session.is_authenticated());
    assert_eq!(session.identity(), Some(identity));
    assert_eq!(session.username(), Some("alice"));
    assert!(!session.is_admin());

    session.logout();
    assert_eq!(session.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn failed_login_leaves_session_anonymous() {
    let ctx = spawn_service().await;
    let alice = ctx.service.create_user("alice", "pw1").await.unwrap();

    let mut session = Session::anonymous();
    session
        .login(&ctx.service, "alice", "pw1", &alice.secret_key)
        .await
        .unwrap();

    let err = session
        .login(&ctx.service, "alice", "wrong", &alice.secret_key)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AuthFailed));
    assert!(!session.is_authenticated());
    assert_eq!(session.identity(), None);
}

#[tokio::test]
async fn admin_role_is_carried_from_login() {
    let ctx = spawn_service().await;
    ctx.service
        .ensure_bootstrap_admin(&ctx.key_dir)
        .await
        .unwrap();
    let key = finledger::services::secret_key::read_key_file(&ctx.key_dir.join("admin.key"))
        .await
        .unwrap();

    let mut session = Session::anonymous();
    session
        .login(&ctx.service, "admin", "admin123", &key)
        .await
        .unwrap();

    assert!(session.is_admin());
}

#[tokio::test]
async fn role_change_applies_from_next_login() {
    let ctx = spawn_service().await;
    let alice = ctx.service.create_user("alice", "pw1").await.unwrap();

    let mut session = Session::anonymous();
    session
        .login(&ctx.service, "alice", "pw1", &alice.secret_key)
        .await
        .unwrap();
    assert!(!session.is_admin());

    ctx.service.set_role(alice.id, true).await.unwrap();
    // The context holds what was established at login.
    assert!(!session.is_admin());

    session.logout();
    session
        .login(&ctx.service, "alice", "pw1", &alice.secret_key)
        .await
        .unwrap();
    assert!(session.is_admin());
}
