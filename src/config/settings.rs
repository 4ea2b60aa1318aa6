//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Hosted auth and row service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub url: String,
    pub anon_key: String,
    /// Privileged key, only needed to roll back a half-finished sign-up
    #[serde(default)]
    pub service_role_key: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    10
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Direct Postgres connection used to provision the schema
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    /// Close idle connections after this long
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: Option<u64>,
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> Option<u64> {
    Some(600)
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_seconds.map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file; stderr only when unset
    pub directory: Option<String>,
    /// Write the log file as JSON lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            json: false,
        }
    }
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Delete the credential again when the profile row of a sign-up fails
    pub signup_compensation: bool,
    /// Show the committee signup tracker
    pub signup_tracker: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            signup_compensation: true,
            signup_tracker: true,
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::CampusError> {
        super::validation::validate_settings(self)
    }

    /// Settings pointing at a given service endpoint, everything else default
    pub fn for_service(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut settings = Self::default();
        settings.service.url = url.into();
        settings.service.anon_key = anon_key.into();
        settings
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                url: String::new(),
                anon_key: String::new(),
                service_role_key: None,
                request_timeout_seconds: default_request_timeout(),
            },
            database: None,
            logging: LoggingConfig::default(),
            features: FeaturesConfig::default(),
        }
    }
}
