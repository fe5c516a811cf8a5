//! Completion tracker service
//!
//! Read-side progress aggregation, per-giver gift-done bookkeeping and the
//! organizer's terminal `mark_complete`.

use serde_json::json;
use tracing::{debug, info};

use crate::database::{
    AssignmentRepository, DatabasePool, EventRepository, OutboxRepository,
    ParticipantRepository,
};
use crate::models::event::{Event, EventStatus};
use crate::models::notification::DomainEventKind;
use crate::state::machine::{self, LifecycleAction};
use crate::utils::errors::{GiftBuddyError, Result};
use crate::utils::logging::log_rejected_operation;

/// Aggregate progress report for one event
#[derive(Debug, Clone, serde::Serialize)]
pub struct EventProgress {
    pub event_id: i64,
    pub status: EventStatus,
    pub total_participants: i64,
    pub accepted_count: i64,
    pub assignment_count: i64,
    pub revealed_count: i64,
    pub gift_done_count: i64,
}

/// Progress service for tracking and closing an exchange
#[derive(Clone)]
pub struct ProgressService {
    pool: DatabasePool,
    events: EventRepository,
    participants: ParticipantRepository,
    assignments: AssignmentRepository,
    outbox: OutboxRepository,
}

impl ProgressService {
    /// Create a new ProgressService instance
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
        }
    }

    /// Aggregate counts for the event page. Pure read-side; consistent with
    /// the assignment table at the time of the query.
    pub async fn progress(&self, event_id: i64) -> Result<EventProgress> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        let (total_participants, accepted_count) = self.participants.counts(event_id).await?;
        let (assignment_count, revealed_count, gift_done_count) =
            self.assignments.progress_counts(event_id).await?;

        Ok(EventProgress {
            event_id,
            status: event.status,
            total_participants,
            accepted_count,
            assignment_count,
            revealed_count,
            gift_done_count,
        })
    }

    /// Mark the caller's own gift as bought/wrapped/handled. Returns true on
    /// the first marking and false on idempotent repeats.
    pub async fn mark_gift_done(&self, event_id: i64, user_id: i64) -> Result<bool> {
        debug!(event_id = event_id, giver_id = user_id, "Marking gift done");

        let mut tx = self.pool.begin().await?;

        // Status check under the event lock: a racing mark_complete either
        // commits before us (we see COMPLETED) or waits for us. Event row
        // before assignment row, same order as every other writer.
        let event = self
            .events
            .lock_by_id(&mut tx, event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        machine::ensure_allowed(LifecycleAction::MarkGiftDone, event.status)?;

        let assignment = self
            .assignments
            .lock_for_giver(&mut tx, event_id, user_id)
            .await?
            .ok_or(GiftBuddyError::NoAssignment { event_id, user_id })?;

        if assignment.gift_done {
            tx.rollback().await?;
            return Ok(false);
        }

        self.assignments.mark_gift_done(&mut tx, assignment.id).await?;
        self.outbox
            .append(
                &mut tx,
                event_id,
                DomainEventKind::GiftMarkedDone,
                json!({ "giver_id": user_id }),
            )
            .await?;

        tx.commit().await?;

        info!(event_id = event_id, giver_id = user_id, "Gift marked done");
        Ok(true)
    }

    /// Close the exchange. Organizer-only; terminal — no assignment or
    /// participant mutation is permitted afterwards.
    pub async fn mark_complete(&self, event_id: i64, caller_id: i64) -> Result<Event> {
        debug!(event_id = event_id, caller_id = caller_id, "Marking event complete");

        let mut tx = self.pool.begin().await?;

        let event = self
            .events
            .lock_by_id(&mut tx, event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        if !event.is_organized_by(caller_id) {
            log_rejected_operation(event_id, caller_id, "mark_complete", "caller is not the organizer");
            return Err(GiftBuddyError::Forbidden(
                "only the organizer may close the event".to_string(),
            ));
        }

        machine::ensure_allowed(LifecycleAction::MarkComplete, event.status)?;
        machine::ensure_transition(event.status, EventStatus::Completed)?;

        let completed = self
            .events
            .transition_status(&mut tx, event_id, event.status, EventStatus::Completed)
            .await?
            .ok_or(GiftBuddyError::InvalidState {
                operation: LifecycleAction::MarkComplete.name().to_string(),
                status: event.status.to_string(),
            })?;

        self.outbox
            .append(
                &mut tx,
                event_id,
                DomainEventKind::EventCompleted,
                json!({ "organizer_id": caller_id }),
            )
            .await?;

        tx.commit().await?;

        info!(event_id = event_id, "Event completed");
        Ok(completed)
    }
}
