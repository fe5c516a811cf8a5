//! Event repository implementation

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::event::{CreateEventRequest, Event, EventStatus, UpdateEventRequest};
use crate::utils::errors::GiftBuddyError;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new PENDING event inside the caller's transaction
    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: &CreateEventRequest,
    ) -> Result<Event, GiftBuddyError> {
        let (budget_minor, budget_currency) = match &request.budget {
            Some(budget) => (Some(budget.amount_minor), Some(budget.currency.clone())),
            None => (None, None),
        };

        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, organizer_id, draw_date, exchange_date, budget_minor, budget_currency, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, title, organizer_id, draw_date, exchange_date, budget_minor, budget_currency, status, created_at, updated_at
            "#
        )
        .bind(&request.title)
        .bind(request.organizer_id)
        .bind(request.draw_date)
        .bind(request.exchange_date)
        .bind(budget_minor)
        .bind(budget_currency)
        .bind(EventStatus::Pending)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, GiftBuddyError> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, title, organizer_id, draw_date, exchange_date, budget_minor, budget_currency, status, created_at, updated_at FROM events WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Lock the event row for the rest of the caller's transaction.
    /// Serializes draw, redraw, complete and delete against each other.
    pub async fn lock_by_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Event>, GiftBuddyError> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, title, organizer_id, draw_date, exchange_date, budget_minor, budget_currency, status, created_at, updated_at FROM events WHERE id = $1 FOR UPDATE"
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(event)
    }

    /// Apply a partial detail update while the event is still PENDING.
    /// Returns None when the row is missing or no longer pending.
    pub async fn update_details(
        &self,
        id: i64,
        request: &UpdateEventRequest,
    ) -> Result<Option<Event>, GiftBuddyError> {
        let (budget_minor, budget_currency) = match &request.budget {
            Some(budget) => (Some(budget.amount_minor), Some(budget.currency.clone())),
            None => (None, None),
        };

        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = COALESCE($3, title),
                draw_date = COALESCE($4, draw_date),
                exchange_date = COALESCE($5, exchange_date),
                budget_minor = COALESCE($6, budget_minor),
                budget_currency = COALESCE($7, budget_currency),
                updated_at = $8
            WHERE id = $1 AND status = $2
            RETURNING id, title, organizer_id, draw_date, exchange_date, budget_minor, budget_currency, status, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(EventStatus::Pending)
        .bind(&request.title)
        .bind(request.draw_date)
        .bind(request.exchange_date)
        .bind(budget_minor)
        .bind(budget_currency)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Move the status from `from` to `to`. Returns None when the row was
    /// not in `from`, which callers treat as a lost (already settled) race.
    pub async fn transition_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>, GiftBuddyError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING id, title, organizer_id, draw_date, exchange_date, budget_minor, budget_currency, status, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(event)
    }

    /// Delete the event; participants and assignments cascade
    pub async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<bool, GiftBuddyError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Events in which the user holds a participant row, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Event>, GiftBuddyError> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.title, e.organizer_id, e.draw_date, e.exchange_date, e.budget_minor, e.budget_currency, e.status, e.created_at, e.updated_at
            FROM events e
            INNER JOIN event_participants ep ON e.id = ep.event_id
            WHERE ep.user_id = $1
            ORDER BY e.exchange_date DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
