//! Data models module
//!
//! This module contains all rows exchanged with the hosted row store

pub mod user;
pub mod event;
pub mod registration;
pub mod activity;
pub mod notification;
pub mod settings;

// Re-export commonly used models
pub use user::{Role, RoleTag, Profile, CreateProfileRequest, UpdateProfileRequest, StudentProfile, TeacherProfile, CommitteeProfile, RoleDetails, DetailedProfile};
pub use event::{Event, CreateEventRequest, UpdateEventRequest};
pub use registration::{Registration, RegistrationStatus, CreateRegistrationRequest};
pub use activity::{Attendance, AttendanceStatus, RecordAttendanceRequest, Payment, PaymentStatus, CreatePaymentRequest};
pub use notification::{Notification, CreateNotificationRequest};
pub use settings::{UserSettings, UpsertSettingsRequest, Preferences};
