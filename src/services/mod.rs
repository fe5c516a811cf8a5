//! Services module
//!
//! This module contains the engine's business logic services

pub mod draw;
pub mod event;
pub mod notification;
pub mod participant;
pub mod progress;
pub mod reveal;

// Re-export commonly used services
pub use draw::{DrawOutcome, DrawService, ExclusionRules};
pub use event::EventService;
pub use notification::NotificationService;
pub use participant::ParticipantService;
pub use progress::{EventProgress, ProgressService};
pub use reveal::{RevealOutcome, RevealService};

use crate::config::settings::Settings;
use crate::database::{connection, DatabasePool};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub participant_service: ParticipantService,
    pub draw_service: DrawService,
    pub reveal_service: RevealService,
    pub progress_service: ProgressService,
    pub notification_service: NotificationService,
    pool: DatabasePool,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized.
    /// Settings are validated up front so a misconfigured engine fails at
    /// startup, not on the first draw.
    pub fn new(pool: DatabasePool, settings: Settings) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            event_service: EventService::new(pool.clone()),
            participant_service: ParticipantService::new(pool.clone(), settings.clone()),
            draw_service: DrawService::new(pool.clone(), settings),
            reveal_service: RevealService::new(pool.clone()),
            progress_service: ProgressService::new(pool.clone()),
            notification_service: NotificationService::new(pool.clone()),
            pool,
        })
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        connection::health_check(&self.pool).await
    }
}
