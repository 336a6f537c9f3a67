//! Self-service credential recovery.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use scivault_core::config::RecoveryConfig;
use scivault_core::events::{EventBus, EventPayload, RecoveryEvent};
use scivault_core::traits::{IdentityStore, SecretHandle};
use scivault_core::AppResult;
use scivault_entity::recovery::ResetRequest;

use crate::registry::GroupRegistry;
use crate::session::SessionManager;

/// What a reset request produced.
///
/// `Rejected` is deliberately shapeless. Unknown usernames, inactive
/// accounts, missing addresses and mismatches all come back as the same
/// value, so the endpoint cannot be used to probe the directory.
#[derive(Debug)]
pub enum ResetOutcome {
    /// The request was validated; the credential was rotated and every
    /// session of the account revoked. The handle carries the new
    /// secret for delivery.
    Completed {
        /// The freshly generated secret.
        secret: SecretHandle,
    },
    /// The request failed validation. Nothing about the account changed.
    Rejected,
}

/// Unauthenticated credential-reset flow.
///
/// Sits outside the session layer entirely: callers have lost their
/// secret, so the only proof of identity is knowing the registered
/// e-mail address for the username. Terminal request records are kept
/// in a bounded in-memory log for audit inspection.
pub struct CredentialRecovery {
    /// Directory of accounts and groups.
    registry: Arc<GroupRegistry>,
    /// Credential backend.
    identity: Arc<dyn IdentityStore>,
    /// Session table, for revoking the account's sessions on rotation.
    sessions: Arc<SessionManager>,
    /// Bus for recovery audit events.
    events: EventBus,
    /// Recovery configuration.
    config: RecoveryConfig,
    /// Terminal request records, most recent first.
    log: Mutex<VecDeque<ResetRequest>>,
}

impl std::fmt::Debug for CredentialRecovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecovery")
            .field("config", &self.config)
            .finish()
    }
}

impl CredentialRecovery {
    /// Creates a new recovery service.
    pub fn new(
        registry: Arc<GroupRegistry>,
        identity: Arc<dyn IdentityStore>,
        sessions: Arc<SessionManager>,
        events: EventBus,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            registry,
            identity,
            sessions,
            events,
            config,
            log: Mutex::new(VecDeque::new()),
        }
    }

    /// Handles a reset request for `username` claiming `supplied_email`.
    ///
    /// On a validated request the identity store rotates the credential
    /// and every session of the account is revoked before this returns,
    /// so the outcome's secret is the only way back in. Any validation
    /// failure yields the generic [`ResetOutcome::Rejected`]; the cause
    /// goes to the log and the event bus, never to the caller.
    pub async fn request_reset(
        &self,
        username: &str,
        supplied_email: &str,
    ) -> AppResult<ResetOutcome> {
        let mut request = ResetRequest::new(username, supplied_email);
        debug!(request_id = %request.id, username = %username, "Credential reset requested");

        if !self.config.enabled {
            return Ok(self.reject(request, "recovery is disabled"));
        }

        let supplied = supplied_email.trim();
        if supplied.is_empty() {
            return Ok(self.reject(request, "blank e-mail"));
        }

        // Exact username match only; this path is unauthenticated.
        let user = match self.registry.find_user_by_name(username).await {
            Ok(user) => user,
            Err(_) => return Ok(self.reject(request, "unknown user")),
        };
        if !user.active {
            return Ok(self.reject(request, "inactive account"));
        }

        let registered = match self.identity.lookup_email(user.id).await {
            Ok(Some(email)) => email,
            Ok(None) => return Ok(self.reject(request, "no e-mail on file")),
            Err(_) => return Ok(self.reject(request, "credential lookup failed")),
        };
        if !registered.eq_ignore_ascii_case(supplied) {
            return Ok(self.reject(request, "e-mail mismatch"));
        }

        request.mark_validated();

        let secret = self.identity.rotate_credential(user.id).await?;
        let revoked = self
            .sessions
            .revoke_all_for_user(user.id, None, "Credential reset")
            .await;

        request.mark_completed();
        info!(
            request_id = %request.id,
            user_id = %user.id,
            sessions_revoked = revoked,
            "Credential reset completed"
        );
        self.events.publish(
            None,
            EventPayload::Recovery(RecoveryEvent::ResetCompleted {
                request_id: request.id,
                user_id: user.id,
                sessions_revoked: revoked,
            }),
        );
        self.remember(request);

        Ok(ResetOutcome::Completed { secret })
    }

    /// Recent terminal request records, most recent first.
    pub fn recent_requests(&self, limit: usize) -> Vec<ResetRequest> {
        let log = self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        log.iter().take(limit).cloned().collect()
    }

    /// Rejects `request`, logging `reason` internally only.
    fn reject(&self, mut request: ResetRequest, reason: &str) -> ResetOutcome {
        request.mark_rejected();
        info!(
            request_id = %request.id,
            username = %request.username,
            reason = reason,
            "Credential reset rejected"
        );
        self.events.publish(
            None,
            EventPayload::Recovery(RecoveryEvent::ResetRejected {
                request_id: request.id,
                username: request.username.clone(),
            }),
        );
        self.remember(request);
        ResetOutcome::Rejected
    }

    /// Appends a terminal record, dropping the oldest past the cap.
    fn remember(&self, request: ResetRequest) {
        let mut log = self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        log.push_front(request);
        log.truncate(self.config.max_log_entries);
    }
}
