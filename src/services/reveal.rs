//! Reveal gate service
//!
//! One-time-reveal access to the caller's own assignment. The receiver id
//! crosses this boundary only for the authenticated giver; every query is
//! filtered by `(event_id, giver_id = caller)` in SQL, and bulk assignment
//! reads do not exist outside the crate.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use crate::database::{
    AssignmentRepository, DatabasePool, EventRepository, OutboxRepository,
};
use crate::models::assignment::AssignmentView;
use crate::models::event::EventStatus;
use crate::models::notification::DomainEventKind;
use crate::state::machine::{self, LifecycleAction};
use crate::utils::errors::{GiftBuddyError, Result};
use crate::utils::logging::log_reveal;

/// Outcome of a reveal call. `first_reveal` is true exactly once per
/// assignment, so the client can fire its celebration exactly once.
#[derive(Debug, Clone)]
pub struct RevealOutcome {
    pub event_id: i64,
    pub giver_id: i64,
    pub receiver_id: i64,
    pub first_reveal: bool,
    pub revealed_at: DateTime<Utc>,
}

/// Reveal service: the only path to a receiver identity
#[derive(Clone)]
pub struct RevealService {
    pool: DatabasePool,
    events: EventRepository,
    assignments: AssignmentRepository,
    outbox: OutboxRepository,
}

impl RevealService {
    /// Create a new RevealService instance
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
        }
    }

    /// Reveal the caller's receiver. The first call stamps `revealed_at`,
    /// moves a freshly drawn event to IN_PROGRESS and appends a domain
    /// event; repeat calls return the same receiver with no side effects.
    pub async fn reveal(&self, event_id: i64, user_id: i64) -> Result<RevealOutcome> {
        debug!(event_id = event_id, giver_id = user_id, "Reveal requested");

        let mut tx = self.pool.begin().await?;

        // Lock order across the crate is events first, assignments second;
        // redraw and delete follow the same order. Holding the event row
        // also makes the status check race-free.
        let event = self
            .events
            .lock_by_id(&mut tx, event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        machine::ensure_allowed(LifecycleAction::RevealAssignment, event.status)?;

        // The row lock serializes concurrent reveals by the same giver
        let assignment = self
            .assignments
            .lock_for_giver(&mut tx, event_id, user_id)
            .await?
            .ok_or(GiftBuddyError::NoAssignment { event_id, user_id })?;

        if assignment.revealed {
            tx.rollback().await?;
            log_reveal(event_id, user_id, false);
            return Ok(RevealOutcome {
                event_id,
                giver_id: user_id,
                receiver_id: assignment.receiver_id,
                first_reveal: false,
                revealed_at: assignment.revealed_at.unwrap_or(assignment.created_at),
            });
        }

        let assignment = self.assignments.mark_revealed(&mut tx, assignment.id).await?;

        // First reveal moves a freshly drawn event into IN_PROGRESS; the
        // guarded update is a no-op for any other status
        self.events
            .transition_status(&mut tx, event_id, EventStatus::Drawn, EventStatus::InProgress)
            .await?;

        self.outbox
            .append(
                &mut tx,
                event_id,
                DomainEventKind::AssignmentRevealed,
                json!({ "giver_id": user_id }),
            )
            .await?;

        tx.commit().await?;

        log_reveal(event_id, user_id, true);
        Ok(RevealOutcome {
            event_id,
            giver_id: user_id,
            receiver_id: assignment.receiver_id,
            first_reveal: true,
            revealed_at: assignment.revealed_at.unwrap_or_else(Utc::now),
        })
    }

    /// The caller's own assignment for rendering, or None when they hold no
    /// giver row. The receiver stays masked until the assignment has been
    /// revealed through `reveal`.
    pub async fn my_assignment(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<AssignmentView>> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        let assignment = self.assignments.find_for_giver(event_id, user_id).await?;
        Ok(assignment.map(AssignmentView::from))
    }
}
