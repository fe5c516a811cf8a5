//! Gift-exchange event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of a gift-exchange event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exchange_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Drawn,
    InProgress,
    Completed,
}

impl EventStatus {
    /// Every status, in lifecycle order
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Pending,
        EventStatus::Drawn,
        EventStatus::InProgress,
        EventStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Drawn => "drawn",
            EventStatus::InProgress => "in_progress",
            EventStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Suggested gift budget, stored in minor currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub organizer_id: i64,
    pub draw_date: DateTime<Utc>,
    pub exchange_date: DateTime<Utc>,
    pub budget_minor: Option<i64>,
    pub budget_currency: Option<String>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Suggested budget, when the organizer set one
    pub fn budget(&self) -> Option<Budget> {
        match (self.budget_minor, self.budget_currency.as_deref()) {
            (Some(amount_minor), Some(currency)) => Some(Budget {
                amount_minor,
                currency: currency.to_string(),
            }),
            _ => None,
        }
    }

    /// Check whether the given user organizes this event
    pub fn is_organized_by(&self, user_id: i64) -> bool {
        self.organizer_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub organizer_id: i64,
    pub draw_date: DateTime<Utc>,
    pub exchange_date: DateTime<Utc>,
    pub budget: Option<Budget>,
}

/// Partial update of event details. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub draw_date: Option<DateTime<Utc>>,
    pub exchange_date: Option<DateTime<Utc>>,
    pub budget: Option<Budget>,
}

/// Event together with its roster, as returned to event pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub event: Event,
    pub participants: Vec<crate::models::participant::Participant>,
    pub invited_count: i64,
    pub accepted_count: i64,
}
