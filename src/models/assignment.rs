//! Assignment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One giver -> receiver pairing produced by the draw
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub event_id: i64,
    pub giver_id: i64,
    pub receiver_id: i64,
    pub revealed: bool,
    pub revealed_at: Option<DateTime<Utc>>,
    pub gift_done: bool,
    pub created_at: DateTime<Utc>,
}

/// Giver-facing view of an assignment. The receiver stays masked until the
/// giver has gone through the one-time reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentView {
    pub event_id: i64,
    pub giver_id: i64,
    pub receiver_id: Option<i64>,
    pub revealed: bool,
    pub revealed_at: Option<DateTime<Utc>>,
    pub gift_done: bool,
}

impl From<Assignment> for AssignmentView {
    fn from(assignment: Assignment) -> Self {
        let receiver_id = if assignment.revealed {
            Some(assignment.receiver_id)
        } else {
            None
        };

        Self {
            event_id: assignment.event_id,
            giver_id: assignment.giver_id,
            receiver_id,
            revealed: assignment.revealed,
            revealed_at: assignment.revealed_at,
            gift_done: assignment.gift_done,
        }
    }
}
