//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use url::Url;
use crate::utils::errors::{CampusError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_service_config(&settings.service)?;
    validate_logging_config(&settings.logging)?;

    if let Some(ref database_config) = settings.database {
        validate_database_config(database_config)?;
    }

    Ok(())
}

/// Validate hosted service configuration
fn validate_service_config(config: &super::ServiceConfig) -> Result<()> {
    if config.url.trim().is_empty() {
        return Err(CampusError::Config(
            "Service URL is required (CAMPUS_SERVICE__URL)".to_string()
        ));
    }

    let url = Url::parse(&config.url)
        .map_err(|e| CampusError::Config(format!("Service URL is invalid: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CampusError::Config(
            format!("Service URL must be http(s), got {}", url.scheme())
        ));
    }

    if config.anon_key.trim().is_empty() {
        return Err(CampusError::Config(
            "Service public API key is required (CAMPUS_SERVICE__ANON_KEY)".to_string()
        ));
    }

    if config.request_timeout_seconds == 0 {
        return Err(CampusError::Config(
            "Request timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CampusError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(CampusError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CampusError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    if config.acquire_timeout_seconds == 0 {
        return Err(CampusError::Config(
            "Database acquire timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CampusError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CampusError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use assert_matches::assert_matches;

    fn valid() -> Settings {
        Settings::for_service("https://campus.example.co", "public-anon-key")
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid()).is_ok());
    }

    #[test]
    fn test_missing_service_values_are_rejected() {
        let mut settings = valid();
        settings.service.url = String::new();
        assert_matches!(validate_settings(&settings), Err(CampusError::Config(msg)) if msg.contains("URL"));

        let mut settings = valid();
        settings.service.anon_key = "  ".to_string();
        assert_matches!(validate_settings(&settings), Err(CampusError::Config(msg)) if msg.contains("key"));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let mut settings = valid();
        settings.service.url = "ftp://campus.example.co".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_database_pool_bounds() {
        let mut settings = valid();
        settings.database = Some(DatabaseConfig {
            url: "postgresql://localhost/campus".to_string(),
            max_connections: 2,
            min_connections: 5,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: None,
        });
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_database_timeouts() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "url": "postgresql://localhost/campus",
            "max_connections": 5,
            "min_connections": 1
        }))
        .unwrap();
        assert_eq!(config.acquire_timeout().as_secs(), 30);
        assert_eq!(config.idle_timeout().map(|d| d.as_secs()), Some(600));

        let mut settings = valid();
        settings.database = Some(DatabaseConfig { acquire_timeout_seconds: 0, ..config });
        assert_matches!(validate_settings(&settings), Err(CampusError::Config(msg)) if msg.contains("acquire"));
    }

    #[test]
    fn test_log_level_checked() {
        let mut settings = valid();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
