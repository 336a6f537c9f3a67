//! Credential-reset request entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use scivault_core::types::ResetRequestId;

/// Lifecycle state of a reset request.
///
/// Legal transitions: `Requested -> Validated -> Completed` and
/// `Requested -> Rejected`. `Completed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetState {
    /// Received, not yet checked against the directory.
    Requested,
    /// The supplied e-mail matched the registered one.
    Validated,
    /// The credential was rotated and sessions revoked.
    Completed,
    /// The request failed validation; the account was not touched.
    Rejected,
}

impl ResetState {
    /// Whether this state can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Validated => "validated",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ResetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An audit record of one credential-reset attempt.
///
/// Retained whether the attempt succeeded or not; the record never says
/// why a rejection happened, only that it did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetRequest {
    /// Unique request identifier.
    pub id: ResetRequestId,
    /// The username as supplied by the caller.
    pub username: String,
    /// The e-mail address as supplied by the caller.
    pub supplied_email: String,
    /// Current lifecycle state.
    pub state: ResetState,
    /// When the request arrived.
    pub requested_at: DateTime<Utc>,
    /// When the request reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ResetRequest {
    /// Record a new incoming request.
    pub fn new(username: impl Into<String>, supplied_email: impl Into<String>) -> Self {
        Self {
            id: ResetRequestId::new(),
            username: username.into(),
            supplied_email: supplied_email.into(),
            state: ResetState::Requested,
            requested_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Transition `Requested -> Validated`. Returns whether the state
    /// changed.
    pub fn mark_validated(&mut self) -> bool {
        if self.state != ResetState::Requested {
            return false;
        }
        self.state = ResetState::Validated;
        true
    }

    /// Transition `Validated -> Completed`. Returns whether the state
    /// changed.
    pub fn mark_completed(&mut self) -> bool {
        if self.state != ResetState::Validated {
            return false;
        }
        self.state = ResetState::Completed;
        self.completed_at = Some(Utc::now());
        true
    }

    /// Transition `Requested -> Rejected`. Returns whether the state
    /// changed.
    pub fn mark_rejected(&mut self) -> bool {
        if self.state != ResetState::Requested {
            return false;
        }
        self.state = ResetState::Rejected;
        self.completed_at = Some(Utc::now());
        true
    }
}
