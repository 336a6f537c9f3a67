//! Session-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, SessionId, UserId};

/// Events related to session lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A user logged in and a session was created.
    Created {
        /// The session ID.
        session_id: SessionId,
        /// The authenticated user.
        user_id: UserId,
        /// The group the session is bound to.
        group_id: GroupId,
    },
    /// An administrator or group owner created an impersonated session.
    Impersonated {
        /// The session ID.
        session_id: SessionId,
        /// The user who actually authenticated.
        owner_user_id: UserId,
        /// The identity being acted as.
        acting_user_id: UserId,
        /// The group the session is bound to.
        group_id: GroupId,
    },
    /// A caller attached to an existing session.
    Joined {
        /// The session ID.
        session_id: SessionId,
        /// The acting user of the session.
        user_id: UserId,
    },
    /// A session was rebound to a different group.
    GroupSwitched {
        /// The session ID.
        session_id: SessionId,
        /// The acting user of the session.
        user_id: UserId,
        /// The new group.
        group_id: GroupId,
    },
    /// A session was revoked by logout or administrative action.
    Revoked {
        /// The session ID.
        session_id: SessionId,
        /// The user whose session was revoked.
        user_id: UserId,
        /// Who revoked it (absent for system-initiated revocation).
        revoked_by: Option<UserId>,
        /// Why the session ended.
        reason: String,
    },
    /// A session timed out and was expired by the background sweep.
    Expired {
        /// The session ID.
        session_id: SessionId,
        /// The user whose session expired.
        user_id: UserId,
    },
}
