//! CampusEvents
//!
//! Client library for a role-based campus event service. Students browse
//! upcoming events and register; teachers and the event committee review
//! registrations, track attendance and payments, and manage events. All data
//! lives in a hosted auth and row store reached over HTTP.

pub mod config;
pub mod dashboard;
pub mod middleware;
pub mod models;
pub mod state;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{CampusError, Result};

// Re-export main components for easy access
pub use dashboard::{gate, route_dashboard, Dashboard, DashboardView, Route, RouteDecision};
pub use state::{AuthContext, AuthState};
pub use store::{StoreConfig, StoreService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
