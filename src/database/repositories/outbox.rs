//! Domain-event log repository implementation

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::notification::{DomainEvent, DomainEventKind};
use crate::utils::errors::GiftBuddyError;

#[derive(Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a log row inside the caller's transaction, so the record and
    /// the mutation it describes commit together
    pub async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        kind: DomainEventKind,
        payload: serde_json::Value,
    ) -> Result<DomainEvent, GiftBuddyError> {
        let entry = sqlx::query_as::<_, DomainEvent>(
            r#"
            INSERT INTO domain_events (event_id, kind, payload, occurred_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_id, kind, payload, occurred_at
            "#,
        )
        .bind(event_id)
        .bind(kind)
        .bind(payload)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Ok(entry)
    }

    /// Log entries strictly after the cursor, oldest first
    pub async fn feed_after(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<DomainEvent>, GiftBuddyError> {
        let entries = sqlx::query_as::<_, DomainEvent>(
            "SELECT id, event_id, kind, payload, occurred_at FROM domain_events WHERE id > $1 ORDER BY id ASC LIMIT $2"
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Full log for one event, oldest first
    pub async fn log_for_event(&self, event_id: i64) -> Result<Vec<DomainEvent>, GiftBuddyError> {
        let entries = sqlx::query_as::<_, DomainEvent>(
            "SELECT id, event_id, kind, payload, occurred_at FROM domain_events WHERE event_id = $1 ORDER BY id ASC"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
