//! Assignment repository implementation
//!
//! Public reads are giver-scoped: nothing here hands one caller another
//! giver's row. Bulk operations exist only for the draw itself and stay
//! crate-private.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::assignment::Assignment;
use crate::utils::errors::GiftBuddyError;

#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bulk-insert freshly drawn (giver, receiver) pairs inside the draw's
    /// transaction. All rows land or none do.
    pub(crate) async fn insert_pairs(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        pairs: &[(i64, i64)],
    ) -> Result<(), GiftBuddyError> {
        let now = Utc::now();
        for (giver_id, receiver_id) in pairs {
            sqlx::query(
                "INSERT INTO assignments (event_id, giver_id, receiver_id, created_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(event_id)
            .bind(giver_id)
            .bind(receiver_id)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Assignment rows already present, checked inside the draw's transaction
    pub async fn count_for_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
    ) -> Result<i64, GiftBuddyError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM assignments WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(count.0)
    }

    /// The caller's own assignment row
    pub async fn find_for_giver(
        &self,
        event_id: i64,
        giver_id: i64,
    ) -> Result<Option<Assignment>, GiftBuddyError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            "SELECT id, event_id, giver_id, receiver_id, revealed, revealed_at, gift_done, created_at FROM assignments WHERE event_id = $1 AND giver_id = $2"
        )
        .bind(event_id)
        .bind(giver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }

    /// Lock the caller's row for the rest of the transaction. Serializes
    /// concurrent reveal / gift-done calls by the same giver. Callers must
    /// already hold the event row lock: events before assignments, always.
    pub async fn lock_for_giver(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        giver_id: i64,
    ) -> Result<Option<Assignment>, GiftBuddyError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            "SELECT id, event_id, giver_id, receiver_id, revealed, revealed_at, gift_done, created_at FROM assignments WHERE event_id = $1 AND giver_id = $2 FOR UPDATE"
        )
        .bind(event_id)
        .bind(giver_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(assignment)
    }

    /// Stamp the one-time reveal on a row already locked by the caller
    pub async fn mark_revealed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Assignment, GiftBuddyError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET revealed = TRUE, revealed_at = $2
            WHERE id = $1 AND revealed_at IS NULL
            RETURNING id, event_id, giver_id, receiver_id, revealed, revealed_at, gift_done, created_at
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Ok(assignment)
    }

    /// Flag the gift as done on a row already locked by the caller
    pub async fn mark_gift_done(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Assignment, GiftBuddyError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET gift_done = TRUE
            WHERE id = $1 AND gift_done = FALSE
            RETURNING id, event_id, giver_id, receiver_id, revealed, revealed_at, gift_done, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(assignment)
    }

    /// Drop the event's whole assignment set. Only the redraw calls this.
    pub(crate) async fn delete_for_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
    ) -> Result<u64, GiftBuddyError> {
        let result = sqlx::query("DELETE FROM assignments WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// (total, revealed, gift_done) counts for the progress report
    pub async fn progress_counts(&self, event_id: i64) -> Result<(i64, i64, i64), GiftBuddyError> {
        let counts: (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE revealed), COUNT(*) FILTER (WHERE gift_done) FROM assignments WHERE event_id = $1"
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
