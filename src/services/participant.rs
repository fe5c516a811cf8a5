//! Participant registry service
//!
//! Invitations, responses and removals for one event's roster. Every
//! mutation runs as a guarded statement plus its domain-event append inside
//! a small transaction, so a racing draw can never interleave with a roster
//! change.

use serde_json::json;
use tracing::debug;

use crate::config::settings::Settings;
use crate::database::{
    DatabasePool, EventRepository, OutboxRepository, ParticipantRepository,
};
use crate::models::event::Event;
use crate::models::notification::DomainEventKind;
use crate::models::participant::{Participant, ParticipantStatus};
use crate::state::machine::{self, LifecycleAction};
use crate::utils::errors::{GiftBuddyError, Result};
use crate::utils::logging::{log_participant_action, log_rejected_operation};

/// Participant service for managing event rosters
#[derive(Clone)]
pub struct ParticipantService {
    pool: DatabasePool,
    events: EventRepository,
    participants: ParticipantRepository,
    outbox: OutboxRepository,
    settings: Settings,
}

impl ParticipantService {
    /// Create a new ParticipantService instance
    pub fn new(pool: DatabasePool, settings: Settings) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
            settings,
        }
    }

    /// Invite a user to the event. A DECLINED participant is re-invited:
    /// their row resets to INVITED with a cleared response.
    pub async fn invite(&self, event_id: i64, caller_id: i64, user_id: i64) -> Result<Participant> {
        debug!(event_id = event_id, user_id = user_id, "Inviting participant");

        let event = self.find_event(event_id).await?;

        if !event.is_organized_by(caller_id) {
            log_rejected_operation(event_id, caller_id, "invite", "caller is not the organizer");
            return Err(GiftBuddyError::Forbidden(
                "only the organizer may invite participants".to_string(),
            ));
        }

        machine::ensure_allowed(LifecycleAction::InviteParticipant, event.status)?;

        if let Some(max) = self.settings.exchange.max_participants {
            let (total, _) = self.participants.counts(event_id).await?;
            if total >= max {
                return Err(GiftBuddyError::InvalidInput(format!(
                    "event roster is full ({max} participants)"
                )));
            }
        }

        let mut tx = self.pool.begin().await?;
        if let Some(participant) = self.participants.try_invite(&mut tx, event_id, user_id).await? {
            self.outbox
                .append(
                    &mut tx,
                    event_id,
                    DomainEventKind::ParticipantInvited,
                    json!({ "user_id": user_id }),
                )
                .await?;
            tx.commit().await?;

            log_participant_action(event_id, user_id, "invited", "invited");
            return Ok(participant);
        }
        tx.rollback().await?;

        // The guarded insert wrote nothing: a row already exists, or the
        // event left PENDING between our check and the write
        match self.participants.find(event_id, user_id).await? {
            Some(existing) if existing.status == ParticipantStatus::Declined => {
                self.reinvite(event_id, user_id).await
            }
            Some(_) => Err(GiftBuddyError::AlreadyInvited { event_id, user_id }),
            None => Err(self
                .invalid_state_now(event_id, LifecycleAction::InviteParticipant)
                .await?),
        }
    }

    /// Accept or decline an open invitation. Repeating the same decision is
    /// a no-op; an ACCEPTED participant may still decline while PENDING, but
    /// a DECLINED one needs a fresh invitation to come back.
    pub async fn respond(&self, event_id: i64, user_id: i64, accept: bool) -> Result<Participant> {
        debug!(
            event_id = event_id,
            user_id = user_id,
            accept = accept,
            "Responding to invitation"
        );

        let event = self.find_event(event_id).await?;
        let participant = self
            .participants
            .find(event_id, user_id)
            .await?
            .ok_or(GiftBuddyError::NotInvited { event_id, user_id })?;

        machine::ensure_allowed(LifecycleAction::RespondToInvitation, event.status)?;

        if participant.is_organizer {
            if accept {
                // The organizer's row is born ACCEPTED
                return Ok(participant);
            }
            return Err(GiftBuddyError::InvalidInput(
                "the organizer cannot decline their own event".to_string(),
            ));
        }

        let target = if accept {
            ParticipantStatus::Accepted
        } else {
            ParticipantStatus::Declined
        };

        if participant.status == target {
            return Ok(participant);
        }

        if participant.status == ParticipantStatus::Declined {
            // A declined participant cannot self-resurrect
            return Err(GiftBuddyError::NotInvited { event_id, user_id });
        }

        let mut tx = self.pool.begin().await?;
        match self
            .participants
            .try_respond(&mut tx, event_id, user_id, participant.status, target)
            .await?
        {
            Some(updated) => {
                let kind = if accept {
                    DomainEventKind::InvitationAccepted
                } else {
                    DomainEventKind::InvitationDeclined
                };
                self.outbox
                    .append(&mut tx, event_id, kind, json!({ "user_id": user_id }))
                    .await?;
                tx.commit().await?;

                log_participant_action(event_id, user_id, "responded", &updated.status.to_string());
                Ok(updated)
            }
            None => {
                tx.rollback().await?;
                // Lost a race: the row or the event changed underneath us
                let refreshed = self.find_event(event_id).await?;
                if machine::ensure_allowed(LifecycleAction::RespondToInvitation, refreshed.status)
                    .is_err()
                {
                    Err(GiftBuddyError::InvalidState {
                        operation: LifecycleAction::RespondToInvitation.name().to_string(),
                        status: refreshed.status.to_string(),
                    })
                } else {
                    Err(GiftBuddyError::NotInvited { event_id, user_id })
                }
            }
        }
    }

    /// Remove a participant from a PENDING event. The organizer row is
    /// untouchable.
    pub async fn remove(&self, event_id: i64, caller_id: i64, user_id: i64) -> Result<()> {
        debug!(event_id = event_id, user_id = user_id, "Removing participant");

        let event = self.find_event(event_id).await?;

        if !event.is_organized_by(caller_id) {
            log_rejected_operation(event_id, caller_id, "remove", "caller is not the organizer");
            return Err(GiftBuddyError::Forbidden(
                "only the organizer may remove participants".to_string(),
            ));
        }

        machine::ensure_allowed(LifecycleAction::RemoveParticipant, event.status)?;

        let participant = self
            .participants
            .find(event_id, user_id)
            .await?
            .ok_or(GiftBuddyError::ParticipantNotFound { event_id, user_id })?;

        if participant.is_organizer {
            return Err(GiftBuddyError::CannotRemoveOrganizer);
        }

        let mut tx = self.pool.begin().await?;
        if self.participants.try_remove(&mut tx, event_id, user_id).await? {
            self.outbox
                .append(
                    &mut tx,
                    event_id,
                    DomainEventKind::ParticipantRemoved,
                    json!({ "user_id": user_id }),
                )
                .await?;
            tx.commit().await?;

            log_participant_action(event_id, user_id, "removed", &participant.status.to_string());
            Ok(())
        } else {
            tx.rollback().await?;
            Err(self
                .invalid_state_now(event_id, LifecycleAction::RemoveParticipant)
                .await?)
        }
    }

    /// Full roster in invitation order
    pub async fn roster(&self, event_id: i64) -> Result<Vec<Participant>> {
        self.find_event(event_id).await?;
        self.participants.list_for_event(event_id).await
    }

    /// (total, accepted) participant counts
    pub async fn counts(&self, event_id: i64) -> Result<(i64, i64)> {
        self.find_event(event_id).await?;
        self.participants.counts(event_id).await
    }

    async fn reinvite(&self, event_id: i64, user_id: i64) -> Result<Participant> {
        let mut tx = self.pool.begin().await?;
        match self.participants.try_reinvite(&mut tx, event_id, user_id).await? {
            Some(participant) => {
                self.outbox
                    .append(
                        &mut tx,
                        event_id,
                        DomainEventKind::ParticipantInvited,
                        json!({ "user_id": user_id, "re_invited": true }),
                    )
                    .await?;
                tx.commit().await?;

                log_participant_action(event_id, user_id, "re-invited", "invited");
                Ok(participant)
            }
            None => {
                tx.rollback().await?;
                // The row left DECLINED concurrently
                Err(GiftBuddyError::AlreadyInvited { event_id, user_id })
            }
        }
    }

    async fn find_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(GiftBuddyError::EventNotFound { event_id })
    }

    async fn invalid_state_now(
        &self,
        event_id: i64,
        action: LifecycleAction,
    ) -> Result<GiftBuddyError> {
        let event = self.find_event(event_id).await?;
        Ok(GiftBuddyError::InvalidState {
            operation: action.name().to_string(),
            status: event.status.to_string(),
        })
    }
}
