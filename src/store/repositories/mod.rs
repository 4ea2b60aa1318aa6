//! Store repositories module
//!
//! This module contains one repository per remote table

pub mod user;
pub mod role_profile;
pub mod event;
pub mod registration;
pub mod activity;
pub mod notification;
pub mod settings;

// Re-export repositories
pub use user::UserRepository;
pub use role_profile::RoleProfileRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use activity::{AttendanceRepository, PaymentRepository};
pub use notification::NotificationRepository;
pub use settings::SettingsRepository;
