//! In-memory identity store backing the external-credential seam.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use scivault_core::config::AuthConfig;
use scivault_core::traits::{IdentityStore, SecretHandle};
use scivault_core::types::UserId;
use scivault_core::{AppError, AppResult};

use crate::password::SecretHasher;

/// Credentials and contact address for one account.
#[derive(Debug, Clone)]
struct CredentialRecord {
    username: String,
    secret_hash: String,
    email: Option<String>,
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// Identity store holding argon2id-hashed secrets in process memory.
///
/// Counts failed verification attempts per account and locks the
/// account once the configured maximum is reached.
pub struct MemoryIdentityStore {
    accounts: DashMap<UserId, CredentialRecord>,
    by_username: DashMap<String, UserId>,
    hasher: SecretHasher,
    config: AuthConfig,
}

impl std::fmt::Debug for MemoryIdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIdentityStore")
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            accounts: DashMap::new(),
            by_username: DashMap::new(),
            hasher: SecretHasher::new(),
            config,
        }
    }

    /// Registers credentials for an account.
    ///
    /// The secret must meet the configured minimum length. Fails with
    /// `Conflict` when the username or user ID is already registered.
    pub fn register_account(
        &self,
        user_id: UserId,
        username: &str,
        secret: &str,
        email: Option<&str>,
    ) -> AppResult<()> {
        if secret.len() < self.config.secret_min_length {
            return Err(AppError::validation(format!(
                "Secret must be at least {} characters",
                self.config.secret_min_length
            )));
        }
        if self.by_username.contains_key(username) || self.accounts.contains_key(&user_id) {
            return Err(AppError::conflict(format!(
                "Credentials for '{username}' already registered"
            )));
        }

        let secret_hash = self.hasher.hash_secret(secret)?;
        self.accounts.insert(
            user_id,
            CredentialRecord {
                username: username.to_string(),
                secret_hash,
                email: email.map(str::to_string),
                failed_attempts: 0,
                locked_until: None,
            },
        );
        self.by_username.insert(username.to_string(), user_id);
        Ok(())
    }

    fn generic_failure() -> AppError {
        AppError::authentication_failed("Invalid username or secret")
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn verify_credentials(&self, username: &str, secret: &str) -> AppResult<UserId> {
        let user_id = match self.by_username.get(username) {
            Some(entry) => *entry.value(),
            None => return Err(Self::generic_failure()),
        };

        let mut record = self
            .accounts
            .get_mut(&user_id)
            .ok_or_else(Self::generic_failure)?;

        if let Some(locked_until) = record.locked_until {
            if locked_until > Utc::now() {
                return Err(AppError::authentication_failed(
                    "Account is temporarily locked",
                ));
            }
            // Lock expired; start over.
            record.locked_until = None;
            record.failed_attempts = 0;
        }

        if self.hasher.secret_matches(secret, &record.secret_hash)? {
            record.failed_attempts = 0;
            return Ok(user_id);
        }

        record.failed_attempts += 1;
        if record.failed_attempts >= self.config.max_failed_attempts {
            let locked_until =
                Utc::now() + Duration::minutes(self.config.lockout_duration_minutes as i64);
            record.locked_until = Some(locked_until);
            warn!(
                user_id = %user_id,
                username = %record.username,
                attempts = record.failed_attempts,
                locked_until = %locked_until,
                "Account locked after repeated failed attempts"
            );
        }
        Err(Self::generic_failure())
    }

    async fn lookup_email(&self, user_id: UserId) -> AppResult<Option<String>> {
        self.accounts
            .get(&user_id)
            .map(|record| record.email.clone())
            .ok_or_else(|| AppError::unknown_user(format!("User {user_id} has no credentials")))
    }

    async fn rotate_credential(&self, user_id: UserId) -> AppResult<SecretHandle> {
        let secret = self
            .hasher
            .generate_secret(self.config.generated_secret_length);
        let secret_hash = self.hasher.hash_secret(&secret)?;

        let mut record = self
            .accounts
            .get_mut(&user_id)
            .ok_or_else(|| AppError::unknown_user(format!("User {user_id} has no credentials")))?;
        record.secret_hash = secret_hash;
        record.failed_attempts = 0;
        record.locked_until = None;

        info!(user_id = %user_id, username = %record.username, "Credential rotated");
        Ok(SecretHandle::new(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scivault_core::error::ErrorKind;

    fn store() -> MemoryIdentityStore {
        MemoryIdentityStore::new(AuthConfig::default())
    }

    #[tokio::test]
    async fn test_register_and_verify() {
        let store = store();
        let user_id = UserId::new();
        store
            .register_account(user_id, "alice", "orchid-flux-42", Some("alice@example.org"))
            .unwrap();

        assert_eq!(
            store
                .verify_credentials("alice", "orchid-flux-42")
                .await
                .unwrap(),
            user_id
        );

        let err = store
            .verify_credentials("alice", "wrong-secret")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationFailed);

        let err = store
            .verify_credentials("nobody", "orchid-flux-42")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_short_secret_rejected() {
        let store = store();
        let err = store
            .register_account(UserId::new(), "alice", "short", None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_lockout_after_failed_attempts() {
        let config = AuthConfig {
            max_failed_attempts: 2,
            ..AuthConfig::default()
        };
        let store = MemoryIdentityStore::new(config);
        let user_id = UserId::new();
        store
            .register_account(user_id, "alice", "orchid-flux-42", None)
            .unwrap();

        for _ in 0..2 {
            let _ = store.verify_credentials("alice", "wrong").await;
        }

        // Locked now, even with the correct secret.
        let err = store
            .verify_credentials("alice", "orchid-flux-42")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_rotation_replaces_secret_and_clears_lock() {
        let config = AuthConfig {
            max_failed_attempts: 1,
            ..AuthConfig::default()
        };
        let store = MemoryIdentityStore::new(config);
        let user_id = UserId::new();
        store
            .register_account(user_id, "alice", "orchid-flux-42", None)
            .unwrap();
        let _ = store.verify_credentials("alice", "wrong").await;

        let handle = store.rotate_credential(user_id).await.unwrap();
        assert_eq!(handle.reveal().len(), AuthConfig::default().generated_secret_length);

        assert!(store.verify_credentials("alice", "orchid-flux-42").await.is_err());
        assert_eq!(
            store
                .verify_credentials("alice", handle.reveal())
                .await
                .unwrap(),
            user_id
        );
    }

    #[tokio::test]
    async fn test_lookup_email() {
        let store = store();
        let with_mail = UserId::new();
        let without_mail = UserId::new();
        store
            .register_account(with_mail, "alice", "orchid-flux-42", Some("alice@example.org"))
            .unwrap();
        store
            .register_account(without_mail, "bob", "orchid-flux-43", None)
            .unwrap();

        assert_eq!(
            store.lookup_email(with_mail).await.unwrap().as_deref(),
            Some("alice@example.org")
        );
        assert_eq!(store.lookup_email(without_mail).await.unwrap(), None);
        let err = store.lookup_email(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownUser);
    }
}
