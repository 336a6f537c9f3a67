//! Group- and membership-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, UserId};

/// Events related to the user/group directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DirectoryEvent {
    /// A new user account was registered.
    UserRegistered {
        /// The new user's ID.
        user_id: UserId,
        /// The new user's login name.
        username: String,
        /// The user's initial group.
        group_id: GroupId,
    },
    /// A new group was created.
    GroupCreated {
        /// The new group's ID.
        group_id: GroupId,
        /// The group's display name.
        name: String,
    },
    /// A user was added to a group.
    MembershipAdded {
        /// The group.
        group_id: GroupId,
        /// The user.
        user_id: UserId,
        /// Whether the user owns the group.
        is_owner: bool,
    },
    /// A user was removed from a group.
    MembershipRemoved {
        /// The group.
        group_id: GroupId,
        /// The user.
        user_id: UserId,
    },
    /// A group was deleted.
    GroupDeleted {
        /// The deleted group's ID.
        group_id: GroupId,
    },
    /// A user account was activated or deactivated.
    UserActivationChanged {
        /// The affected user.
        user_id: UserId,
        /// The new activation flag.
        active: bool,
    },
}
