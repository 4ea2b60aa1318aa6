//! Middleware module
//!
//! This module contains the role checks every dashboard action passes through

pub mod auth;

// Re-export commonly used middleware
pub use auth::{Permission, RoleGuard};
