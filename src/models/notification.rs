//! Domain-event log model
//!
//! Every state change appends one row to the `domain_events` table in the
//! same transaction as the mutation itself. A notification collaborator
//! polls the log and handles delivery; the engine never pushes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of state change recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "domain_event_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DomainEventKind {
    EventCreated,
    ParticipantInvited,
    InvitationAccepted,
    InvitationDeclined,
    ParticipantRemoved,
    NamesDrawn,
    NamesRedrawn,
    AssignmentRevealed,
    GiftMarkedDone,
    EventCompleted,
    EventDeleted,
}

impl DomainEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainEventKind::EventCreated => "event_created",
            DomainEventKind::ParticipantInvited => "participant_invited",
            DomainEventKind::InvitationAccepted => "invitation_accepted",
            DomainEventKind::InvitationDeclined => "invitation_declined",
            DomainEventKind::ParticipantRemoved => "participant_removed",
            DomainEventKind::NamesDrawn => "names_drawn",
            DomainEventKind::NamesRedrawn => "names_redrawn",
            DomainEventKind::AssignmentRevealed => "assignment_revealed",
            DomainEventKind::GiftMarkedDone => "gift_marked_done",
            DomainEventKind::EventCompleted => "event_completed",
            DomainEventKind::EventDeleted => "event_deleted",
        }
    }
}

impl std::fmt::Display for DomainEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only log row. Payloads identify actors by user id but never
/// carry a receiver id: the log must not leak the secret mapping.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DomainEvent {
    pub id: i64,
    pub event_id: i64,
    pub kind: DomainEventKind,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}
