//! Session entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use scivault_core::types::{GroupId, SessionId, UserId};

use super::state::SessionState;

/// A server session binding a user to an active group.
///
/// `owner_user_id` is the identity that authenticated; `acting_user_id`
/// is the identity calls run as. They differ only for impersonated
/// sessions, so audit can always recover who really logged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// The user who authenticated this session.
    pub owner_user_id: UserId,
    /// The user whose identity calls run as.
    pub acting_user_id: UserId,
    /// The group calls are scoped to.
    pub group_id: GroupId,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Idle timeout in milliseconds.
    pub timeout_ms: i64,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last call attached to this session.
    pub last_activity: DateTime<Utc>,
    /// The user who revoked this session (if revoked).
    pub revoked_by: Option<UserId>,
    /// Reason given at revocation.
    pub revoked_reason: Option<String>,
    /// When the session left the `Active` state.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new active session.
    pub fn new(
        owner_user_id: UserId,
        acting_user_id: UserId,
        group_id: GroupId,
        timeout_ms: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            owner_user_id,
            acting_user_id,
            group_id,
            state: SessionState::Active,
            timeout_ms,
            created_at: now,
            last_activity: now,
            revoked_by: None,
            revoked_reason: None,
            closed_at: None,
        }
    }

    /// Check whether the session still accepts calls.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Check whether this session runs as someone other than the
    /// authenticated user.
    pub fn is_impersonated(&self) -> bool {
        self.owner_user_id != self.acting_user_id
    }

    /// The instant the idle timeout elapses if no further call arrives.
    /// Saturates at the end of the representable range, so an oversized
    /// timeout reads as a session that never idles out.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.last_activity
            .checked_add_signed(Duration::milliseconds(self.timeout_ms))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Check whether the sweep should expire this session at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.deadline() <= now
    }

    /// Record activity, pushing the idle deadline forward.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Transition `Active -> Expired`. Returns whether the state changed;
    /// terminal states are left untouched.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = SessionState::Expired;
        self.closed_at = Some(now);
        true
    }

    /// Transition `Active -> Revoked`. Returns whether the state changed;
    /// terminal states are left untouched.
    pub fn mark_revoked(&mut self, by: Option<UserId>, reason: impl Into<String>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = SessionState::Revoked;
        self.revoked_by = by;
        self.revoked_reason = Some(reason.into());
        self.closed_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(timeout_ms: i64) -> Session {
        Session::new(UserId::new(), UserId::new(), GroupId::new(), timeout_ms)
    }

    #[test]
    fn test_deadline_tracks_last_activity() {
        let mut s = session(50_000);
        let first = s.deadline();
        assert_eq!(first, s.last_activity + Duration::milliseconds(50_000));

        s.touch();
        assert!(s.deadline() >= first);
    }

    #[test]
    fn test_oversized_timeout_saturates_deadline() {
        let s = session(i64::MAX);
        assert_eq!(s.deadline(), DateTime::<Utc>::MAX_UTC);
        assert!(!s.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_expiry_only_from_active() {
        let mut s = session(50_000);
        let later = s.deadline() + Duration::milliseconds(1);
        assert!(s.is_expired_at(later));

        assert!(s.mark_expired(later));
        assert_eq!(s.state, SessionState::Expired);
        assert!(!s.is_expired_at(later));
        assert!(!s.mark_expired(later));
    }

    #[test]
    fn test_terminal_states_never_transition() {
        let mut s = session(50_000);
        let actor = UserId::new();
        assert!(s.mark_revoked(Some(actor), "operator request"));
        assert_eq!(s.state, SessionState::Revoked);
        assert_eq!(s.revoked_by, Some(actor));

        assert!(!s.mark_expired(Utc::now()));
        assert!(!s.mark_revoked(None, "again"));
        assert_eq!(s.state, SessionState::Revoked);
        assert_eq!(s.revoked_reason.as_deref(), Some("operator request"));
    }

    #[test]
    fn test_impersonation_flag() {
        let owner = UserId::new();
        let target = UserId::new();
        assert!(!Session::new(owner, owner, GroupId::new(), 1_000).is_impersonated());
        assert!(Session::new(owner, target, GroupId::new(), 1_000).is_impersonated());
    }
}
