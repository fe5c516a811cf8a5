//! Error handling for GiftBuddy
//!
//! This module defines the main error types used throughout the engine
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for GiftBuddy operations
#[derive(Error, Debug)]
pub enum GiftBuddyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Participant not found in event {event_id}: user {user_id}")]
    ParticipantNotFound { event_id: i64, user_id: i64 },

    #[error("No assignment for user {user_id} in event {event_id}")]
    NoAssignment { event_id: i64, user_id: i64 },

    #[error("User {user_id} is already invited to event {event_id}")]
    AlreadyInvited { event_id: i64, user_id: i64 },

    #[error("User {user_id} has no open invitation for event {event_id}")]
    NotInvited { event_id: i64, user_id: i64 },

    #[error("Names have already been drawn for event {event_id}")]
    AlreadyDrawn { event_id: i64 },

    #[error("The organizer cannot be removed from their own event")]
    CannotRemoveOrganizer,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Event {event_id} needs at least {minimum} accepted participants, has {accepted}")]
    InsufficientParticipants {
        event_id: i64,
        accepted: i64,
        minimum: i64,
    },

    #[error("No valid assignment satisfies the exclusion rules after {attempts} attempts")]
    UnsatisfiableConstraints { attempts: u32 },

    #[error("Operation '{operation}' is not allowed while the event is {status}")]
    InvalidState { operation: String, status: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for GiftBuddy operations
pub type Result<T> = std::result::Result<T, GiftBuddyError>;

impl GiftBuddyError {
    /// Check if the error is a caller-facing business failure rather than an
    /// infrastructure fault. Recoverable errors map to user-visible messages
    /// in the calling layer.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GiftBuddyError::Database(_) => false,
            GiftBuddyError::Migration(_) => false,
            GiftBuddyError::Config(_) => false,
            GiftBuddyError::Serialization(_) => false,
            GiftBuddyError::Io(_) => false,
            GiftBuddyError::EventNotFound { .. } => true,
            GiftBuddyError::ParticipantNotFound { .. } => true,
            GiftBuddyError::NoAssignment { .. } => true,
            GiftBuddyError::AlreadyInvited { .. } => true,
            GiftBuddyError::NotInvited { .. } => true,
            GiftBuddyError::AlreadyDrawn { .. } => true,
            GiftBuddyError::CannotRemoveOrganizer => true,
            GiftBuddyError::Forbidden(_) => true,
            GiftBuddyError::InsufficientParticipants { .. } => true,
            GiftBuddyError::UnsatisfiableConstraints { .. } => true,
            GiftBuddyError::InvalidState { .. } => true,
            GiftBuddyError::InvalidStateTransition { .. } => true,
            GiftBuddyError::InvalidInput(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GiftBuddyError::Database(_) => ErrorSeverity::Critical,
            GiftBuddyError::Migration(_) => ErrorSeverity::Critical,
            GiftBuddyError::Config(_) => ErrorSeverity::Critical,
            GiftBuddyError::Io(_) => ErrorSeverity::Error,
            GiftBuddyError::Serialization(_) => ErrorSeverity::Error,
            GiftBuddyError::Forbidden(_) => ErrorSeverity::Warning,
            GiftBuddyError::CannotRemoveOrganizer => ErrorSeverity::Warning,
            GiftBuddyError::UnsatisfiableConstraints { .. } => ErrorSeverity::Warning,
            GiftBuddyError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
