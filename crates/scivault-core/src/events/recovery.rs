//! Credential-recovery domain events.
//!
//! These events are internal audit signals. The caller-facing recovery
//! response never distinguishes rejection causes; the event stream may.

use serde::{Deserialize, Serialize};

use crate::types::{ResetRequestId, UserId};

/// Events emitted by the credential-recovery flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecoveryEvent {
    /// A reset request was validated and completed: the credential was
    /// rotated and all of the account's sessions were invalidated.
    ResetCompleted {
        /// The reset request ID.
        request_id: ResetRequestId,
        /// The affected account.
        user_id: UserId,
        /// Number of sessions invalidated alongside the rotation.
        sessions_revoked: u32,
    },
    /// A reset request was rejected. The account (if any) is untouched.
    ResetRejected {
        /// The reset request ID.
        request_id: ResetRequestId,
        /// The username as supplied by the caller.
        username: String,
    },
}
