//! Identity store abstraction.
//!
//! The directory and session layers never touch credentials directly;
//! everything secret-shaped goes through this trait so the backing
//! store (in-memory, LDAP, external IdP) can be swapped out.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::UserId;

/// An opaque secret returned by credential rotation.
///
/// The wrapper exists so the plaintext never shows up in `Debug`
/// output or log lines by accident. Call [`SecretHandle::reveal`] at
/// the single point where the value is handed to the user.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHandle(String);

impl SecretHandle {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The plaintext secret.
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHandle(redacted)")
    }
}

/// Backend holding credentials and contact addresses for user accounts.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Verify a username/secret pair, returning the account's user ID.
    ///
    /// Fails with `AuthenticationFailed` on any mismatch. The error
    /// message must not distinguish unknown users from wrong secrets.
    async fn verify_credentials(&self, username: &str, secret: &str) -> AppResult<UserId>;

    /// Look up the registered recovery email for an account.
    ///
    /// Returns `Ok(None)` when the account has no email on file.
    async fn lookup_email(&self, user_id: UserId) -> AppResult<Option<String>>;

    /// Replace the account's credential with a freshly generated one.
    ///
    /// The previous secret stops working immediately.
    async fn rotate_credential(&self, user_id: UserId) -> AppResult<SecretHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_handle_debug_is_redacted() {
        let handle = SecretHandle::new("hunter2");
        let rendered = format!("{handle:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(handle.reveal(), "hunter2");
    }
}
