//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the engine.

use chrono::{DateTime, Utc};

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Validate an ISO-4217-style currency code: three uppercase ASCII letters
pub fn is_valid_currency_code(code: &str) -> bool {
    regex::Regex::new(r"^[A-Z]{3}$")
        .map(|re| re.is_match(code))
        .unwrap_or(false)
}

/// Format a budget stored in minor currency units, e.g. 2500 -> "25.00 EUR"
pub fn format_budget(amount_minor: i64, currency: &str) -> String {
    format!(
        "{}.{:02} {}",
        amount_minor / 100,
        (amount_minor % 100).abs(),
        currency
    )
}

/// Normalize an event title: trim and collapse inner whitespace
pub fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}
