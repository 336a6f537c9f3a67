//! User account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scivault_core::types::UserId;

/// A user account in the directory.
///
/// Secrets and recovery e-mail addresses live behind the identity-store
/// collaborator, never on this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Display name shown in audit output.
    pub display_name: String,
    /// Whether the account may authenticate.
    pub active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Create a new active account.
    pub fn new(id: UserId, username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name: display_name.into(),
            active: true,
            created_at: Utc::now(),
        }
    }
}
