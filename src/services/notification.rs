//! Notification feed service
//!
//! Read access to the append-only domain-event log for a notification
//! collaborator. The engine records what happened; delivery (push, bot,
//! e-mail) lives entirely outside this crate and polls the feed by cursor.

use tracing::debug;

use crate::database::{DatabasePool, OutboxRepository};
use crate::models::notification::DomainEvent;
use crate::utils::errors::Result;

/// Upper bound on one feed page
const MAX_FEED_LIMIT: i64 = 500;

/// Notification service exposing the domain-event feed
#[derive(Clone)]
pub struct NotificationService {
    outbox: OutboxRepository,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            outbox: OutboxRepository::new(pool),
        }
    }

    /// Log entries strictly after the cursor, oldest first. The caller
    /// advances its cursor to the last returned id.
    pub async fn feed_after(&self, after_id: i64, limit: i64) -> Result<Vec<DomainEvent>> {
        let limit = limit.clamp(1, MAX_FEED_LIMIT);
        debug!(after_id = after_id, limit = limit, "Reading domain-event feed");
        self.outbox.feed_after(after_id, limit).await
    }

    /// Full log for one event, oldest first
    pub async fn event_log(&self, event_id: i64) -> Result<Vec<DomainEvent>> {
        self.outbox.log_for_event(event_id).await
    }
}
