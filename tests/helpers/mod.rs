//! Shared test helpers for integration tests.

use std::sync::Arc;

use scivault_auth::{
    AccessGate, CredentialRecovery, EventContext, GroupRegistry, MemoryIdentityStore,
    SessionManager,
};
use scivault_core::config::AppConfig;
use scivault_core::events::EventBus;
use scivault_core::types::{GroupId, SessionId, UserId};
use scivault_entity::group::Group;
use scivault_entity::permission::PermissionSet;

/// Fully wired platform core for integration tests.
pub struct TestVault {
    /// Application config the platform was built from.
    pub config: AppConfig,
    /// The shared event bus.
    pub events: EventBus,
    /// User/group directory.
    pub registry: Arc<GroupRegistry>,
    /// In-memory credential store.
    pub identity: Arc<MemoryIdentityStore>,
    /// Session table and lifecycle.
    pub sessions: Arc<SessionManager>,
    /// Credential-reset flow.
    pub recovery: Arc<CredentialRecovery>,
    /// Permission checks.
    pub gate: AccessGate,
    /// Context for the bootstrapped root administrator.
    pub admin: EventContext,
}

impl TestVault {
    /// Create a platform with default configuration.
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a platform with the given configuration.
    pub async fn with_config(config: AppConfig) -> Self {
        let events = EventBus::default();
        let registry = Arc::new(GroupRegistry::new(config.auth.clone(), events.clone()));
        let (system, root) = registry
            .bootstrap()
            .await
            .expect("Failed to bootstrap directory");

        let identity = Arc::new(MemoryIdentityStore::new(config.auth.clone()));
        identity
            .register_account(root.id, &root.username, &config.auth.root_secret, None)
            .expect("Failed to seed root credentials");

        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&registry),
            identity.clone(),
            events.clone(),
            config.session.clone(),
        ));
        let recovery = Arc::new(CredentialRecovery::new(
            Arc::clone(&registry),
            identity.clone(),
            Arc::clone(&sessions),
            events.clone(),
            config.recovery.clone(),
        ));

        let admin = registry
            .build_context(root.id, system.id, SessionId::new())
            .await
            .expect("Failed to build root context");

        Self {
            config,
            events,
            registry,
            identity,
            sessions,
            recovery,
            gate: AccessGate::new(),
            admin,
        }
    }

    /// Create a group with the given default permissions.
    pub async fn create_group(&self, name: &str, permissions: PermissionSet) -> Group {
        self.registry
            .create_group(&self.admin, name, permissions)
            .await
            .expect("Failed to create group")
    }

    /// Create a user with credentials and a first membership.
    pub async fn create_user(
        &self,
        username: &str,
        secret: &str,
        email: Option<&str>,
        group: GroupId,
        is_owner: bool,
    ) -> UserId {
        let user = self
            .registry
            .register_user(&self.admin, username, username, group, is_owner)
            .await
            .expect("Failed to register user");
        self.identity
            .register_account(user.id, username, secret, email)
            .expect("Failed to register credentials");
        user.id
    }

    /// Build a context for a user acting in a group.
    pub async fn context(&self, user: UserId, group: GroupId) -> EventContext {
        self.registry
            .build_context(user, group, SessionId::new())
            .await
            .expect("Failed to build context")
    }
}
