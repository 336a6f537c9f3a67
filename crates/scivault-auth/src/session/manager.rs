//! Session lifecycle manager: login, impersonation, joining, revocation.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info};

use scivault_core::config::SessionConfig;
use scivault_core::events::{EventBus, EventPayload, SessionEvent};
use scivault_core::traits::IdentityStore;
use scivault_core::types::{GroupId, SessionId, UserId};
use scivault_core::{AppError, AppResult};
use scivault_entity::session::Session;

use crate::context::EventContext;
use crate::registry::GroupRegistry;

/// Owns the session table and drives every state transition.
///
/// Sessions live in a sharded map keyed by session ID plus a by-owner
/// index, so unrelated sessions never contend on one lock. Terminal
/// records stay in the table for audit; the by-owner index only tracks
/// active sessions. Identity-store and registry calls always happen
/// before a table entry is locked.
pub struct SessionManager {
    /// All sessions by ID, including terminal ones.
    sessions: DashMap<SessionId, Session>,
    /// Active session IDs per authenticating user.
    by_owner: DashMap<UserId, Vec<SessionId>>,
    /// The group directory.
    registry: Arc<GroupRegistry>,
    /// Credential backend.
    identity: Arc<dyn IdentityStore>,
    /// Bus for session lifecycle events.
    events: EventBus,
    /// Session configuration.
    config: SessionConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        registry: Arc<GroupRegistry>,
        identity: Arc<dyn IdentityStore>,
        events: EventBus,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            by_owner: DashMap::new(),
            registry,
            identity,
            events,
            config,
        }
    }

    /// Authenticates a principal and opens a session.
    ///
    /// The session is scoped to `group` when given (`NotMember` if the
    /// principal does not belong to it), otherwise to the principal's
    /// default group. The identity store decides `AuthenticationFailed`;
    /// its message never distinguishes unknown users from wrong secrets.
    pub async fn create_session(
        &self,
        username: &str,
        secret: &str,
        group: Option<GroupId>,
    ) -> AppResult<Session> {
        let user_id = self.identity.verify_credentials(username, secret).await?;

        let group_id = match group {
            Some(gid) => gid,
            None => self.registry.resolve_default_group(user_id).await?,
        };

        let session = Session::new(user_id, user_id, group_id, self.config.default_timeout_ms);
        // Validates that the account is active and a member of the group.
        self.registry
            .build_context(user_id, group_id, session.id)
            .await?;

        self.insert(session.clone());
        info!(
            user_id = %user_id,
            session_id = %session.id,
            group_id = %group_id,
            "Session created"
        );
        self.events.publish(
            Some(user_id),
            EventPayload::Session(SessionEvent::Created {
                session_id: session.id,
                user_id,
                group_id,
            }),
        );

        Ok(session)
    }

    /// Opens a session that runs as another user ("sudo").
    ///
    /// Allowed for admins against any user, and for owners of the target
    /// group when the target user belongs to the system group. The
    /// session records the caller as owner and the target as acting
    /// user, and the timeout is capped at the configured maximum.
    pub async fn create_impersonated_session(
        &self,
        ctx: &EventContext,
        target_user_name: &str,
        target_group_name: &str,
        timeout_ms: i64,
    ) -> AppResult<Session> {
        if timeout_ms <= 0 {
            return Err(AppError::validation("Session timeout must be positive"));
        }
        let timeout_ms = timeout_ms.min(self.config.max_timeout_ms);

        let target = self.registry.find_user_by_name(target_user_name).await?;
        let group = self.registry.find_group_by_name(target_group_name).await?;

        let allowed = ctx.is_admin
            || (self.registry.is_group_owner(ctx.user_id, group.id).await
                && self.registry.is_system_group_member(target.id).await);
        if !allowed {
            return Err(AppError::not_authorized(
                "Impersonation requires system administration or ownership of the target group",
            ));
        }

        let session = Session::new(ctx.user_id, target.id, group.id, timeout_ms);
        // Validates that the target is active and a member of the group.
        self.registry
            .build_context(target.id, group.id, session.id)
            .await?;

        self.insert(session.clone());
        info!(
            owner_user_id = %ctx.user_id,
            acting_user_id = %target.id,
            session_id = %session.id,
            group_id = %group.id,
            timeout_ms = timeout_ms,
            "Impersonated session created"
        );
        self.events.publish(
            Some(ctx.user_id),
            EventPayload::Session(SessionEvent::Impersonated {
                session_id: session.id,
                owner_user_id: ctx.user_id,
                acting_user_id: target.id,
                group_id: group.id,
            }),
        );

        Ok(session)
    }

    /// Attaches a call to an active session, refreshing its activity.
    ///
    /// Revoked sessions are indistinguishable from ones that never
    /// existed. A session past its deadline but not yet swept still
    /// joins; only the sweep decides expiry.
    pub async fn join_session(&self, session_id: SessionId) -> AppResult<Session> {
        let session = {
            let mut entry = self
                .sessions
                .get_mut(&session_id)
                .ok_or_else(|| Self::not_found(session_id))?;
            Self::ensure_active(&entry)?;
            entry.touch();
            entry.clone()
        };

        debug!(session_id = %session_id, "Session joined");
        self.events.publish(
            Some(session.acting_user_id),
            EventPayload::Session(SessionEvent::Joined {
                session_id,
                user_id: session.acting_user_id,
            }),
        );
        Ok(session)
    }

    /// Joins the session and builds the context its calls run under.
    ///
    /// This is the hook the transport invokes before dispatching a call.
    pub async fn context_for(&self, session_id: SessionId) -> AppResult<EventContext> {
        let session = self.join_session(session_id).await?;
        self.registry
            .build_context(session.acting_user_id, session.group_id, session.id)
            .await
    }

    /// Rebinds the session to another of the acting user's groups and
    /// returns a fresh context. Contexts already issued are unaffected.
    pub async fn switch_group(
        &self,
        session_id: SessionId,
        group_id: GroupId,
    ) -> AppResult<EventContext> {
        let acting_user_id = {
            let entry = self
                .sessions
                .get(&session_id)
                .ok_or_else(|| Self::not_found(session_id))?;
            Self::ensure_active(&entry)?;
            entry.acting_user_id
        };

        // Membership check happens without any table lock held.
        let ctx = self
            .registry
            .build_context(acting_user_id, group_id, session_id)
            .await?;

        {
            let mut entry = self
                .sessions
                .get_mut(&session_id)
                .ok_or_else(|| Self::not_found(session_id))?;
            Self::ensure_active(&entry)?;
            entry.group_id = group_id;
            entry.touch();
        }

        info!(
            session_id = %session_id,
            user_id = %acting_user_id,
            group_id = %group_id,
            "Session group switched"
        );
        self.events.publish(
            Some(acting_user_id),
            EventPayload::Session(SessionEvent::GroupSwitched {
                session_id,
                user_id: acting_user_id,
                group_id,
            }),
        );
        Ok(ctx)
    }

    /// Revokes a session. Idempotent: revoking an already terminal
    /// session is a no-op.
    pub async fn revoke(
        &self,
        session_id: SessionId,
        by: Option<UserId>,
        reason: &str,
    ) -> AppResult<()> {
        self.revoke_entry(session_id, by, reason)?;
        Ok(())
    }

    /// Revokes every active session owned by the user. Returns how many
    /// sessions actually changed state.
    pub async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        by: Option<UserId>,
        reason: &str,
    ) -> u32 {
        let ids: Vec<SessionId> = self
            .by_owner
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let mut revoked = 0u32;
        for id in ids {
            match self.revoke_entry(id, by, reason) {
                Ok(true) => revoked += 1,
                Ok(false) => {}
                // The index can briefly lag a concurrent transition.
                Err(_) => {}
            }
        }

        if revoked > 0 {
            info!(user_id = %user_id, revoked = revoked, reason = %reason, "User sessions revoked");
        }
        revoked
    }

    /// Expires every active session whose idle deadline has passed.
    /// Returns how many sessions were expired.
    pub async fn sweep(&self) -> u32 {
        let now = Utc::now();
        let candidates: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| *entry.key())
            .collect();

        if candidates.is_empty() {
            return 0;
        }

        let mut expired = 0u32;
        for id in candidates {
            let changed = {
                let Some(mut entry) = self.sessions.get_mut(&id) else {
                    continue;
                };
                // A join or revoke may have won the race since the scan.
                if !entry.is_expired_at(now) {
                    continue;
                }
                entry.mark_expired(now)
            };

            if changed {
                let acting = self.prune_index(id);
                expired += 1;
                debug!(session_id = %id, "Session expired");
                if let Some(user_id) = acting {
                    self.events.publish(
                        None,
                        EventPayload::Session(SessionEvent::Expired {
                            session_id: id,
                            user_id,
                        }),
                    );
                }
            }
        }

        info!(expired = expired, "Session sweep completed");
        expired
    }

    /// Looks up a session by ID, terminal ones included.
    pub fn find(&self, session_id: SessionId) -> Option<Session> {
        self.sessions
            .get(&session_id)
            .map(|entry| entry.value().clone())
    }

    /// Number of sessions currently in the `Active` state.
    pub fn active_session_count(&self) -> usize {
        self.by_owner.iter().map(|entry| entry.value().len()).sum()
    }

    /// Active sessions owned by the user, oldest first.
    pub fn active_sessions_for(&self, user_id: UserId) -> Vec<Session> {
        let ids: Vec<SessionId> = self
            .by_owner
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        ids.into_iter()
            .filter_map(|id| self.find(id))
            .filter(Session::is_active)
            .collect()
    }

    fn insert(&self, session: Session) {
        self.by_owner
            .entry(session.owner_user_id)
            .or_default()
            .push(session.id);
        self.sessions.insert(session.id, session);
    }

    /// Removes the session from the by-owner index, returning the acting
    /// user recorded on it.
    fn prune_index(&self, session_id: SessionId) -> Option<UserId> {
        let session = self.find(session_id)?;
        if let Some(mut ids) = self.by_owner.get_mut(&session.owner_user_id) {
            ids.retain(|id| *id != session_id);
        }
        // Atomic check-and-remove; an insert racing in keeps its entry.
        self.by_owner
            .remove_if(&session.owner_user_id, |_, ids| ids.is_empty());
        Some(session.acting_user_id)
    }

    fn revoke_entry(
        &self,
        session_id: SessionId,
        by: Option<UserId>,
        reason: &str,
    ) -> AppResult<bool> {
        let changed = {
            let mut entry = self
                .sessions
                .get_mut(&session_id)
                .ok_or_else(|| Self::not_found(session_id))?;
            entry.mark_revoked(by, reason)
        };

        if changed {
            let acting = self.prune_index(session_id);
            info!(session_id = %session_id, reason = %reason, "Session revoked");
            if let Some(user_id) = acting {
                self.events.publish(
                    by,
                    EventPayload::Session(SessionEvent::Revoked {
                        session_id,
                        user_id,
                        revoked_by: by,
                        reason: reason.to_string(),
                    }),
                );
            }
        }
        Ok(changed)
    }

    fn not_found(session_id: SessionId) -> AppError {
        AppError::session_not_found(format!("Session {session_id} does not exist"))
    }

    /// Maps terminal states to the errors callers see: revoked sessions
    /// look exactly like unknown ones.
    fn ensure_active(session: &Session) -> AppResult<()> {
        use scivault_entity::session::SessionState;
        match session.state {
            SessionState::Active => Ok(()),
            SessionState::Expired => Err(AppError::session_expired(format!(
                "Session {} has expired",
                session.id
            ))),
            SessionState::Revoked => Err(Self::not_found(session.id)),
        }
    }
}
