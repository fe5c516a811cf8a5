//! Configuration validation module
//!
//! This module provides validation functions for engine configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{GiftBuddyError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_exchange_config(&settings.exchange)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GiftBuddyError::Config(
            "Database URL is required".to_string(),
        ));
    }

    if config.max_connections == 0 {
        return Err(GiftBuddyError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(GiftBuddyError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate gift-exchange rules configuration
fn validate_exchange_config(config: &super::ExchangeConfig) -> Result<()> {
    // Below three participants a draw cannot keep anyone's receiver secret
    if config.min_participants < 3 {
        return Err(GiftBuddyError::Config(
            "min_participants must be at least 3".to_string(),
        ));
    }

    if config.draw_max_attempts == 0 {
        return Err(GiftBuddyError::Config(
            "draw_max_attempts must be greater than 0".to_string(),
        ));
    }

    if let Some(max) = config.max_participants {
        if max < config.min_participants {
            return Err(GiftBuddyError::Config(
                "max_participants cannot be lower than min_participants".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(GiftBuddyError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(GiftBuddyError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    if config.file_path.is_empty() {
        return Err(GiftBuddyError::Config(
            "Log file path is required".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_pass_validation() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_min_participants_floor() {
        let mut settings = Settings::default();
        settings.exchange.min_participants = 2;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_roster_cap_must_cover_minimum() {
        let mut settings = Settings::default();
        settings.exchange.max_participants = Some(2);
        assert!(validate_settings(&settings).is_err());

        settings.exchange.max_participants = Some(30);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
