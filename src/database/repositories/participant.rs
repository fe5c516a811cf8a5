//! Participant repository implementation
//!
//! Mutations are single guarded statements: the event-status predicate is
//! embedded in the INSERT/UPDATE/DELETE itself, so participant operations
//! need no event-level lock and cannot slip past a concurrent draw.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::event::EventStatus;
use crate::models::participant::{Participant, ParticipantStatus};
use crate::utils::errors::GiftBuddyError;

#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the organizer's own ACCEPTED row alongside event creation
    pub async fn create_organizer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<Participant, GiftBuddyError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO event_participants (event_id, user_id, status, is_organizer, invited_at, responded_at)
            VALUES ($1, $2, $3, TRUE, $4, $4)
            RETURNING id, event_id, user_id, status, is_organizer, invited_at, responded_at
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .bind(ParticipantStatus::Accepted)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Ok(participant)
    }

    /// Insert an INVITED row while the event is PENDING. Returns None when a
    /// row already exists or the event left PENDING in the meantime.
    pub async fn try_invite(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, GiftBuddyError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO event_participants (event_id, user_id, status, is_organizer, invited_at)
            SELECT $1, $2, $3, FALSE, $4
            WHERE EXISTS (SELECT 1 FROM events WHERE id = $1 AND status = $5)
            ON CONFLICT (event_id, user_id) DO NOTHING
            RETURNING id, event_id, user_id, status, is_organizer, invited_at, responded_at
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .bind(ParticipantStatus::Invited)
        .bind(Utc::now())
        .bind(EventStatus::Pending)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(participant)
    }

    /// Reset a DECLINED row back to INVITED (re-invitation). Returns None
    /// when the row is not currently DECLINED or the event left PENDING.
    pub async fn try_reinvite(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, GiftBuddyError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE event_participants
            SET status = $3, invited_at = $4, responded_at = NULL
            WHERE event_id = $1 AND user_id = $2 AND status = $5
              AND EXISTS (SELECT 1 FROM events WHERE id = $1 AND status = $6)
            RETURNING id, event_id, user_id, status, is_organizer, invited_at, responded_at
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .bind(ParticipantStatus::Invited)
        .bind(Utc::now())
        .bind(ParticipantStatus::Declined)
        .bind(EventStatus::Pending)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(participant)
    }

    /// Find participant row by (event, user)
    pub async fn find(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, GiftBuddyError> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT id, event_id, user_id, status, is_organizer, invited_at, responded_at FROM event_participants WHERE event_id = $1 AND user_id = $2"
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Flip `from` to `to` while the event is PENDING. Returns None when the
    /// row is no longer in `from` or the event left PENDING.
    pub async fn try_respond(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
        from: ParticipantStatus,
        to: ParticipantStatus,
    ) -> Result<Option<Participant>, GiftBuddyError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE event_participants
            SET status = $4, responded_at = $5
            WHERE event_id = $1 AND user_id = $2 AND status = $3
              AND EXISTS (SELECT 1 FROM events WHERE id = $1 AND status = $6)
            RETURNING id, event_id, user_id, status, is_organizer, invited_at, responded_at
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .bind(EventStatus::Pending)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(participant)
    }

    /// Remove a non-organizer row while the event is PENDING
    pub async fn try_remove(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<bool, GiftBuddyError> {
        let result = sqlx::query(
            r#"
            DELETE FROM event_participants
            WHERE event_id = $1 AND user_id = $2 AND is_organizer = FALSE
              AND EXISTS (SELECT 1 FROM events WHERE id = $1 AND status = $3)
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(EventStatus::Pending)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Full roster in invitation order
    pub async fn list_for_event(&self, event_id: i64) -> Result<Vec<Participant>, GiftBuddyError> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT id, event_id, user_id, status, is_organizer, invited_at, responded_at FROM event_participants WHERE event_id = $1 ORDER BY invited_at ASC, id ASC"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Accepted participant ids, read inside the draw's transaction so the
    /// set cannot shift between check and insert
    pub async fn accepted_ids(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
    ) -> Result<Vec<i64>, GiftBuddyError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM event_participants WHERE event_id = $1 AND status = $2 ORDER BY user_id ASC"
        )
        .bind(event_id)
        .bind(ParticipantStatus::Accepted)
        .fetch_all(&mut **tx)
        .await?;

        Ok(ids)
    }

    /// (total, accepted) participant counts
    pub async fn counts(&self, event_id: i64) -> Result<(i64, i64), GiftBuddyError> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = $2) FROM event_participants WHERE event_id = $1"
        )
        .bind(event_id)
        .bind(ParticipantStatus::Accepted)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
