//! Store module
//!
//! This module talks to the hosted auth and row service

pub mod auth;
pub mod connection;
pub mod migrations;
pub mod query;
pub mod repositories;
pub mod service;

// Re-export commonly used store components
pub use auth::{AuthClient, AuthUser, Session, SessionEvent, SessionStore, SignUpMetadata, SignUpResult};
pub use connection::{RemoteClient, StoreConfig, Credential, health_check};
pub use query::RowQuery;
pub use repositories::{UserRepository, RoleProfileRepository, EventRepository, RegistrationRepository, AttendanceRepository, PaymentRepository, NotificationRepository, SettingsRepository};
pub use service::StoreService;
