//! Integration tests for login and the session lifecycle.

mod helpers;

use helpers::TestVault;
use scivault_core::config::AppConfig;
use scivault_core::error::ErrorKind;
use scivault_entity::permission::PermissionSet;
use scivault_entity::session::SessionState;

#[tokio::test]
async fn test_root_can_login() {
    let vault = TestVault::new().await;

    let session = vault
        .sessions
        .create_session(
            &vault.config.auth.root_username,
            &vault.config.auth.root_secret,
            None,
        )
        .await
        .expect("root login failed");

    assert_eq!(session.state, SessionState::Active);
    assert_eq!(session.group_id, vault.admin.group_id);

    let ctx = vault.sessions.context_for(session.id).await.unwrap();
    assert!(ctx.is_admin);
}

#[tokio::test]
async fn test_member_login_join_and_logout() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    let alice = vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;

    let session = vault
        .sessions
        .create_session("alice", "orchid-flux-42", None)
        .await
        .unwrap();
    assert_eq!(session.owner_user_id, alice);
    assert_eq!(session.acting_user_id, alice);

    let ctx = vault.sessions.context_for(session.id).await.unwrap();
    assert_eq!(ctx.user_name, "alice");
    assert_eq!(ctx.group_name, "microscopy");
    assert!(!ctx.is_admin);

    vault
        .sessions
        .revoke(session.id, Some(alice), "logout")
        .await
        .unwrap();
    let err = vault.sessions.join_session(session.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionNotFound);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;

    let wrong_secret = vault
        .sessions
        .create_session("alice", "not-the-secret", None)
        .await
        .unwrap_err();
    let unknown_user = vault
        .sessions
        .create_session("mallory", "not-the-secret", None)
        .await
        .unwrap_err();

    assert_eq!(wrong_secret.kind, ErrorKind::AuthenticationFailed);
    assert_eq!(unknown_user.kind, ErrorKind::AuthenticationFailed);
    assert_eq!(wrong_secret.message, unknown_user.message);
}

#[tokio::test]
async fn test_lockout_after_repeated_failures() {
    let mut config = AppConfig::default();
    config.auth.max_failed_attempts = 2;
    let vault = TestVault::with_config(config).await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;

    for _ in 0..2 {
        let err = vault
            .sessions
            .create_session("alice", "not-the-secret", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
    }

    // Even the correct secret is refused while the lock holds.
    let err = vault
        .sessions
        .create_session("alice", "orchid-flux-42", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
    assert!(err.message.contains("locked"));
}

#[tokio::test]
async fn test_group_override_requires_membership() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    let other = vault.create_group("chemistry", PermissionSet::default()).await;
    let alice = vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;

    let err = vault
        .sessions
        .create_session("alice", "orchid-flux-42", Some(other.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotMember);

    vault
        .registry
        .add_membership(&vault.admin, other.id, alice, false)
        .await
        .unwrap();
    let session = vault
        .sessions
        .create_session("alice", "orchid-flux-42", Some(other.id))
        .await
        .unwrap();
    assert_eq!(session.group_id, other.id);
}

#[tokio::test]
async fn test_switch_group_rebinds_session() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    let other = vault.create_group("chemistry", PermissionSet::default()).await;
    let alice = vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;
    vault
        .registry
        .add_membership(&vault.admin, other.id, alice, false)
        .await
        .unwrap();

    let session = vault
        .sessions
        .create_session("alice", "orchid-flux-42", None)
        .await
        .unwrap();
    assert_eq!(session.group_id, lab.id);

    let ctx = vault
        .sessions
        .switch_group(session.id, other.id)
        .await
        .unwrap();
    assert_eq!(ctx.group_id, other.id);
    assert_eq!(
        vault.sessions.find(session.id).unwrap().group_id,
        other.id
    );
}
