//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod assignment;
pub mod event;
pub mod outbox;
pub mod participant;

// Re-export repositories
pub use assignment::AssignmentRepository;
pub use event::EventRepository;
pub use outbox::OutboxRepository;
pub use participant::ParticipantRepository;
