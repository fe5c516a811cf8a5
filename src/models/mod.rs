//! Data models module
//!
//! This module contains all data structures used throughout the engine

pub mod assignment;
pub mod event;
pub mod notification;
pub mod participant;

// Re-export commonly used models
pub use assignment::{Assignment, AssignmentView};
pub use event::{Budget, CreateEventRequest, Event, EventStatus, EventSummary, UpdateEventRequest};
pub use notification::{DomainEvent, DomainEventKind};
pub use participant::{Participant, ParticipantStatus};
