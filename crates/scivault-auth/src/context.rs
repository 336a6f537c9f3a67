//! Event context carrying the acting identity for one server call.

use serde::{Deserialize, Serialize};

use scivault_core::types::{GroupId, SessionId, UserId};

/// Immutable identity snapshot attached to one server call.
///
/// Built from the session and the directory at dispatch time and never
/// mutated afterwards, so every operation knows *who* is acting and in
/// *which* group. For impersonated sessions `user_id` names the target
/// user; the session record keeps the authenticating owner for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    /// The acting user's ID.
    pub user_id: UserId,
    /// The acting user's login name.
    pub user_name: String,
    /// The group this call is scoped to.
    pub group_id: GroupId,
    /// The group's name.
    pub group_name: String,
    /// The session the call arrived on.
    pub session_id: SessionId,
    /// Whether the acting user holds an owner-flagged membership in the
    /// system group.
    pub is_admin: bool,
    /// Whether the acting user holds any membership in the system group.
    pub is_system_group_member: bool,
}
