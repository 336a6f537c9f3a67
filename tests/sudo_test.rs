//! Integration tests for impersonated ("sudo") sessions.

mod helpers;

use helpers::TestVault;
use scivault_core::error::ErrorKind;
use scivault_entity::permission::PermissionSet;

#[tokio::test]
async fn test_admin_impersonates_member() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    let alice = vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;

    let session = vault
        .sessions
        .create_impersonated_session(&vault.admin, "alice", "microscopy", 50_000)
        .await
        .unwrap();

    assert!(session.is_impersonated());
    assert_eq!(session.owner_user_id, vault.admin.user_id);
    assert_eq!(session.acting_user_id, alice);
    assert_eq!(session.timeout_ms, 50_000);

    // Calls through this session run as the target, not the admin.
    let ctx = vault.sessions.context_for(session.id).await.unwrap();
    assert_eq!(ctx.user_id, alice);
    assert_eq!(ctx.user_name, "alice");
    assert!(!ctx.is_admin);
}

#[tokio::test]
async fn test_plain_member_cannot_impersonate() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    let alice = vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;
    vault
        .create_user("bob", "quartz-vein-77", None, lab.id, false)
        .await;

    let alice_ctx = vault.context(alice, lab.id).await;
    let err = vault
        .sessions
        .create_impersonated_session(&alice_ctx, "bob", "microscopy", 50_000)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_group_owner_sudo_covers_system_members_only() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    let pi = vault
        .create_user("prof", "sapphire-rig-88", None, lab.id, true)
        .await;
    let technician = vault
        .create_user("tech", "pyrite-husk-19", None, lab.id, false)
        .await;
    let pi_ctx = vault.context(pi, lab.id).await;

    let err = vault
        .sessions
        .create_impersonated_session(&pi_ctx, "tech", "microscopy", 50_000)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    // Service accounts live in the system group; those are fair game.
    vault
        .registry
        .add_membership(&vault.admin, vault.admin.group_id, technician, false)
        .await
        .unwrap();
    let session = vault
        .sessions
        .create_impersonated_session(&pi_ctx, "tech", "microscopy", 50_000)
        .await
        .unwrap();
    assert_eq!(session.owner_user_id, pi);
    assert_eq!(session.acting_user_id, technician);
}

#[tokio::test]
async fn test_sudo_timeout_bounds() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;

    let err = vault
        .sessions
        .create_impersonated_session(&vault.admin, "alice", "microscopy", 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let session = vault
        .sessions
        .create_impersonated_session(&vault.admin, "alice", "microscopy", i64::MAX)
        .await
        .unwrap();
    assert_eq!(session.timeout_ms, vault.config.session.max_timeout_ms);
}

#[tokio::test]
async fn test_sudo_session_belongs_to_the_actor() {
    let vault = TestVault::new().await;
    let lab = vault.create_group("microscopy", PermissionSet::default()).await;
    let alice = vault
        .create_user("alice", "orchid-flux-42", None, lab.id, false)
        .await;

    let own = vault
        .sessions
        .create_session("alice", "orchid-flux-42", None)
        .await
        .unwrap();
    let sudo = vault
        .sessions
        .create_impersonated_session(&vault.admin, "alice", "microscopy", 50_000)
        .await
        .unwrap();

    // Revoking alice's sessions hits her login, not the admin's sudo
    // session; that one was authenticated with the admin's credential.
    let revoked = vault
        .sessions
        .revoke_all_for_user(alice, Some(vault.admin.user_id), "account review")
        .await;
    assert_eq!(revoked, 1);

    let err = vault.sessions.join_session(own.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionNotFound);
    vault.sessions.join_session(sudo.id).await.unwrap();
}
