//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the GiftBuddy engine.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// Returns the appender guard; the embedding application must keep it alive
/// or buffered file output is lost on shutdown.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "giftbuddy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event lifecycle actions with structured data
pub fn log_event_action(event_id: i64, action: &str, user_id: i64, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log participant registry changes
pub fn log_participant_action(event_id: i64, user_id: i64, action: &str, status: &str) {
    info!(
        event_id = event_id,
        user_id = user_id,
        action = action,
        status = status,
        "Participant action performed"
    );
}

/// Log the outcome of a name draw. Never logs the pairings themselves.
pub fn log_draw(event_id: i64, participant_count: usize, attempts: u32) {
    info!(
        event_id = event_id,
        participant_count = participant_count,
        attempts = attempts,
        "Names drawn"
    );
}

/// Log a reveal. The receiver never appears in log output.
pub fn log_reveal(event_id: i64, giver_id: i64, first_reveal: bool) {
    if first_reveal {
        info!(event_id = event_id, giver_id = giver_id, "Assignment revealed");
    } else {
        debug!(
            event_id = event_id,
            giver_id = giver_id,
            "Assignment re-read after reveal"
        );
    }
}

/// Log a rejected operation, graded by error severity
pub fn log_rejected_operation(event_id: i64, user_id: i64, operation: &str, reason: &str) {
    warn!(
        event_id = event_id,
        user_id = user_id,
        operation = operation,
        reason = reason,
        "Operation rejected"
    );
}
