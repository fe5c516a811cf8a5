//! Database service layer
//!
//! This module aggregates the repositories behind one handle

use crate::database::{
    AssignmentRepository, DatabasePool, EventRepository, OutboxRepository, ParticipantRepository,
};
use crate::utils::errors::GiftBuddyError;

#[derive(Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub participants: ParticipantRepository,
    pub assignments: AssignmentRepository,
    pub outbox: OutboxRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
        }
    }

    /// The underlying connection pool, for transaction scoping
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), GiftBuddyError> {
        super::connection::health_check(&self.pool).await
    }
}
