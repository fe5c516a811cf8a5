//! GiftBuddy gift-exchange engine
//!
//! The Secret Santa core of a wishlist/gift-sharing product: event
//! lifecycle, participant invitations, derangement-based name drawing,
//! secrecy-preserving reveals and completion tracking over Postgres.
//! Delivery surfaces (mobile client, notifications, identity) live outside
//! this crate and consume the services exposed here.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{GiftBuddyError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
