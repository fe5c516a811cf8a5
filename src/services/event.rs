//! Event service implementation
//!
//! This service owns event creation, detail edits, deletion and the
//! read-side event queries. The organizer's own ACCEPTED participant row is
//! created in the same transaction as the event itself, so an event without
//! its organizer on the roster is never observable.

use serde_json::json;
use tracing::debug;

use crate::database::{
    DatabasePool, EventRepository, OutboxRepository, ParticipantRepository,
};
use crate::models::event::{
    Budget, CreateEventRequest, Event, EventSummary, UpdateEventRequest,
};
use crate::models::notification::DomainEventKind;
use crate::state::machine::{self, LifecycleAction};
use crate::utils::errors::{GiftBuddyError, Result};
use crate::utils::helpers;
use crate::utils::logging::{log_event_action, log_rejected_operation};

/// Event service for managing the event lifecycle surface
#[derive(Clone)]
pub struct EventService {
    pool: DatabasePool,
    events: EventRepository,
    participants: ParticipantRepository,
    outbox: OutboxRepository,
}

impl EventService {
    /// Create a new EventService instance
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new PENDING event with the organizer as its first (ACCEPTED)
    /// participant
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<Event> {
        debug!(organizer_id = request.organizer_id, "Creating event");

        let title = validate_title(&request.title)?;
        validate_dates(&request.draw_date, &request.exchange_date)?;
        if let Some(budget) = &request.budget {
            validate_budget(budget)?;
        }

        let request = CreateEventRequest { title, ..request };

        let mut tx = self.pool.begin().await?;

        let event = self.events.create(&mut tx, &request).await?;
        self.participants
            .create_organizer(&mut tx, event.id, event.organizer_id)
            .await?;
        self.outbox
            .append(
                &mut tx,
                event.id,
                DomainEventKind::EventCreated,
                json!({ "organizer_id": event.organizer_id, "title": event.title }),
            )
            .await?;

        tx.commit().await?;

        log_event_action(event.id, "created", event.organizer_id, None);
        Ok(event)
    }

    /// Update title, dates or budget while the event is still PENDING.
    /// `None` fields are left unchanged; the effective values are revalidated.
    pub async fn update_event(
        &self,
        event_id: i64,
        caller_id: i64,
        request: UpdateEventRequest,
    ) -> Result<Event> {
        debug!(event_id = event_id, caller_id = caller_id, "Updating event");

        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        if !event.is_organized_by(caller_id) {
            log_rejected_operation(event_id, caller_id, "update_event", "caller is not the organizer");
            return Err(GiftBuddyError::Forbidden(
                "only the organizer may edit the event".to_string(),
            ));
        }

        machine::ensure_allowed(LifecycleAction::EditDetails, event.status)?;

        let title = match &request.title {
            Some(title) => Some(validate_title(title)?),
            None => None,
        };
        let draw_date = request.draw_date.unwrap_or(event.draw_date);
        let exchange_date = request.exchange_date.unwrap_or(event.exchange_date);
        validate_dates(&draw_date, &exchange_date)?;
        if let Some(budget) = &request.budget {
            validate_budget(budget)?;
        }

        let request = UpdateEventRequest { title, ..request };

        match self.events.update_details(event_id, &request).await? {
            Some(updated) => {
                log_event_action(event_id, "updated", caller_id, None);
                Ok(updated)
            }
            // The guarded UPDATE found no PENDING row: the event moved on
            // between our check and the write
            None => Err(self.invalid_state_now(event_id, LifecycleAction::EditDetails).await?),
        }
    }

    /// Delete the event; participants and assignments cascade. The deletion
    /// record is appended first so it survives in the log.
    pub async fn delete_event(&self, event_id: i64, caller_id: i64) -> Result<()> {
        debug!(event_id = event_id, caller_id = caller_id, "Deleting event");

        let mut tx = self.pool.begin().await?;

        let event = self
            .events
            .lock_by_id(&mut tx, event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        if !event.is_organized_by(caller_id) {
            log_rejected_operation(event_id, caller_id, "delete_event", "caller is not the organizer");
            return Err(GiftBuddyError::Forbidden(
                "only the organizer may delete the event".to_string(),
            ));
        }

        self.outbox
            .append(
                &mut tx,
                event_id,
                DomainEventKind::EventDeleted,
                json!({ "organizer_id": caller_id }),
            )
            .await?;
        self.events.delete(&mut tx, event_id).await?;

        tx.commit().await?;

        log_event_action(event_id, "deleted", caller_id, None);
        Ok(())
    }

    /// Event together with its full roster and accepted/total counts
    pub async fn get_event(&self, event_id: i64) -> Result<EventSummary> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        let participants = self.participants.list_for_event(event_id).await?;
        let (invited_count, accepted_count) = self.participants.counts(event_id).await?;

        Ok(EventSummary {
            event,
            participants,
            invited_count,
            accepted_count,
        })
    }

    /// Events in which the user holds a participant row, newest first
    pub async fn list_events_for_user(&self, user_id: i64) -> Result<Vec<Event>> {
        self.events.list_for_user(user_id).await
    }

    /// Reconstruct the InvalidState error with the freshly read status
    async fn invalid_state_now(
        &self,
        event_id: i64,
        action: LifecycleAction,
    ) -> Result<GiftBuddyError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })?;

        Ok(GiftBuddyError::InvalidState {
            operation: action.name().to_string(),
            status: event.status.to_string(),
        })
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = helpers::normalize_title(title);
    if title.is_empty() {
        return Err(GiftBuddyError::InvalidInput(
            "event title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > 200 {
        return Err(GiftBuddyError::InvalidInput(
            "event title is limited to 200 characters".to_string(),
        ));
    }
    Ok(title)
}

fn validate_dates(
    draw_date: &chrono::DateTime<chrono::Utc>,
    exchange_date: &chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    if draw_date >= exchange_date {
        return Err(GiftBuddyError::InvalidInput(
            "draw date must precede the exchange date".to_string(),
        ));
    }
    Ok(())
}

fn validate_budget(budget: &Budget) -> Result<()> {
    if budget.amount_minor < 0 {
        return Err(GiftBuddyError::InvalidInput(
            "budget amount must not be negative".to_string(),
        ));
    }
    if !helpers::is_valid_currency_code(&budget.currency) {
        return Err(GiftBuddyError::InvalidInput(format!(
            "invalid currency code: {}",
            budget.currency
        )));
    }
    Ok(())
}
