//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the CampusEvents application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::utils::errors::{CampusError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| CampusError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "campus-events.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
                Box::new(layer.json())
            } else {
                Box::new(layer)
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| CampusError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: Uuid, action: &str, details: Option<&str>) {
    info!(
        user_id = %user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log event management actions
pub fn log_event_action(event_id: Uuid, action: &str, user_id: Uuid, details: Option<&str>) {
    info!(
        event_id = %event_id,
        action = action,
        user_id = %user_id,
        details = details,
        "Event action performed"
    );
}

/// Log session transitions
pub fn log_session_change(change: &str, user_id: Option<Uuid>) {
    debug!(
        change = change,
        user_id = ?user_id,
        "Session state changed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &CampusError, context: Option<&str>) {
    if error.is_recoverable() {
        warn!(
            api = api,
            error = %error,
            severity = %error.severity(),
            context = context,
            "API error occurred"
        );
    } else {
        error!(
            api = api,
            error = %error,
            severity = %error.severity(),
            context = context,
            "API error occurred"
        );
    }
}

/// Log remote requests
pub fn log_request(method: &str, resource: &str, duration_ms: u64, status: Option<u16>) {
    match status {
        Some(status) if status < 400 => debug!(
            method = method,
            resource = resource,
            duration_ms = duration_ms,
            status = status,
            "Remote request completed"
        ),
        _ => warn!(
            method = method,
            resource = resource,
            duration_ms = duration_ms,
            status = status,
            "Remote request failed"
        ),
    }
}
