//! Domain events emitted by SciVault operations.
//!
//! Events are dispatched through the event bus and consumed by audit
//! logging and any other observer that subscribes. Publication is
//! fire-and-forget: a bus without subscribers drops events silently.

pub mod directory;
pub mod recovery;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub use directory::DirectoryEvent;
pub use recovery::RecoveryEvent;
pub use session::SessionEvent;

use crate::types::UserId;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who caused the event (if applicable).
    pub actor_id: Option<UserId>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A session-related event.
    Session(SessionEvent),
    /// A directory-related event.
    Directory(DirectoryEvent),
    /// A credential-recovery event.
    Recovery(RecoveryEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<UserId>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}

/// Broadcast bus carrying [`DomainEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    /// The broadcast sender; receivers are created on demand.
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received the event. An
    /// empty bus is not an error.
    pub fn publish(&self, actor_id: Option<UserId>, payload: EventPayload) -> usize {
        self.tx
            .send(DomainEvent::new(actor_id, payload))
            .unwrap_or(0)
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
