//! Error handling for CampusEvents
//!
//! This module defines the main error type used throughout the application
//! and the classification helpers the dashboards use to decide what to show.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for CampusEvents
#[derive(Error, Debug)]
pub enum CampusError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Session expired")]
    SessionExpired,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Rejected by row-level policy: {0}")]
    PolicyRejected(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Duplicate record: {0}")]
    UniqueViolation(String),

    #[error("Referenced record does not exist: {0}")]
    ForeignKeyViolation(String),

    #[error("Remote service error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Sign-up incomplete for {user_id}: profile was not created ({reason}); credential removed: {compensated}")]
    IncompleteSignUp { user_id: Uuid, compensated: bool, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for CampusEvents operations
pub type Result<T> = std::result::Result<T, CampusError>;

impl CampusError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CampusError::Database(_) => false,
            CampusError::Migration(_) => false,
            CampusError::Network(_) => true,
            CampusError::Timeout { .. } => true,
            CampusError::Cancelled => true,
            CampusError::InvalidCredentials => true,
            CampusError::SessionExpired => true,
            CampusError::NotAuthenticated => true,
            CampusError::PolicyRejected(_) => false,
            CampusError::NotFound { .. } => true,
            CampusError::UniqueViolation(_) => true,
            CampusError::ForeignKeyViolation(_) => false,
            CampusError::Remote { status, .. } => *status >= 500,
            CampusError::InvalidStateTransition { .. } => false,
            CampusError::PermissionDenied(_) => false,
            CampusError::IncompleteSignUp { .. } => false,
            CampusError::Config(_) => false,
            CampusError::InvalidInput(_) => true,
            CampusError::Serialization(_) => false,
            CampusError::UrlParse(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CampusError::Database(_) => ErrorSeverity::Critical,
            CampusError::Migration(_) => ErrorSeverity::Critical,
            CampusError::Config(_) => ErrorSeverity::Critical,
            CampusError::IncompleteSignUp { compensated: false, .. } => ErrorSeverity::Critical,
            CampusError::PermissionDenied(_) => ErrorSeverity::Warning,
            CampusError::PolicyRejected(_) => ErrorSeverity::Warning,
            CampusError::InvalidCredentials => ErrorSeverity::Warning,
            CampusError::SessionExpired => ErrorSeverity::Warning,
            CampusError::NotAuthenticated => ErrorSeverity::Warning,
            CampusError::Cancelled => ErrorSeverity::Info,
            CampusError::InvalidInput(_) => ErrorSeverity::Info,
            CampusError::UniqueViolation(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether the error came from the caller's session rather than the request itself
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            CampusError::InvalidCredentials | CampusError::SessionExpired | CampusError::NotAuthenticated
        )
    }

    /// Message suitable for an inline notice
    pub fn user_message(&self) -> String {
        match self {
            CampusError::Remote { message, .. } => message.clone(),
            CampusError::UniqueViolation(message) => message.clone(),
            CampusError::ForeignKeyViolation(message) => message.clone(),
            CampusError::PolicyRejected(message) => message.clone(),
            other => other.to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        assert_eq!(CampusError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(CampusError::InvalidCredentials.severity(), ErrorSeverity::Warning);
        assert_eq!(CampusError::Cancelled.severity(), ErrorSeverity::Info);
        assert_eq!(
            CampusError::IncompleteSignUp { user_id: Uuid::nil(), compensated: true, reason: "policy".into() }.severity(),
            ErrorSeverity::Error
        );
    }

    #[test]
    fn test_remote_errors_recoverable_only_when_server_side() {
        let server = CampusError::Remote { status: 503, message: "down".into() };
        let client = CampusError::Remote { status: 400, message: "bad".into() };
        assert!(server.is_recoverable());
        assert!(!client.is_recoverable());
    }

    #[test]
    fn test_user_message_uses_remote_text() {
        let err = CampusError::Remote { status: 400, message: "violates check constraint".into() };
        assert_eq!(err.user_message(), "violates check constraint");
        assert!(CampusError::SessionExpired.is_auth_error());
    }
}
