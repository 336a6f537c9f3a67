//! Group and membership entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scivault_core::types::{GroupId, UserId};

use crate::permission::{PermissionSet, Securable};

/// A tenant group scoping data visibility.
///
/// Exactly one reserved system group exists for administrators; it is
/// created at bootstrap and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique group identifier.
    pub id: GroupId,
    /// Unique human-readable group name.
    pub name: String,
    /// Free-form description.
    pub details: Option<String>,
    /// Mask applied to objects created in this group unless overridden
    /// per object.
    pub default_permissions: PermissionSet,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Create a new group with the given default mask.
    pub fn new(id: GroupId, name: impl Into<String>, default_permissions: PermissionSet) -> Self {
        Self {
            id,
            name: name.into(),
            details: None,
            default_permissions,
            created_at: Utc::now(),
        }
    }
}

impl Securable for Group {
    fn permissions_mut(&mut self) -> &mut PermissionSet {
        &mut self.default_permissions
    }
}

/// A user's membership in a group.
///
/// Many-to-many; every active user holds at least one membership, and
/// the chronologically first one is the default session group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// The member.
    pub user_id: UserId,
    /// The group.
    pub group_id: GroupId,
    /// Whether the member administers this group.
    pub is_owner: bool,
    /// When the membership was granted.
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Create a new membership dated now.
    pub fn new(user_id: UserId, group_id: GroupId, is_owner: bool) -> Self {
        Self {
            user_id,
            group_id,
            is_owner,
            joined_at: Utc::now(),
        }
    }
}
