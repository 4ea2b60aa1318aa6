//! Dashboard module
//!
//! Role dispatch, route gating and the per-role views

pub mod committee;
pub mod router;
pub mod scope;
pub mod staff;
pub mod student;
pub mod teacher;
pub mod tracker;

use std::fmt;
use std::time::Duration;
use crate::config::FeaturesConfig;
use crate::state::AuthState;
use crate::store::StoreService;
use crate::utils::errors::Result;

// Re-export commonly used dashboard components
pub use committee::CommitteeDashboard;
pub use router::{gate, route_dashboard, DashboardView, Route, RouteDecision};
pub use scope::{ScopeCanceller, ViewScope, DEFAULT_VIEW_TIMEOUT};
pub use staff::{EventBoard, NewEvent};
pub use student::{EventAction, EventCard, RegisterOutcome, StatusEntry, StudentDashboard};
pub use teacher::TeacherDashboard;
pub use tracker::{SignupTracker, TrackerTab};

/// Inline message shown above a dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Info(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Success(m) => write!(f, "[ok] {}", m),
            Notice::Info(m) => write!(f, "[i] {}", m),
            Notice::Error(m) => write!(f, "[!] {}", m),
        }
    }
}

/// What opening the dashboard route produced
#[derive(Debug)]
pub enum Opened {
    Ready(Dashboard),
    /// Nothing to build; show the view's notice instead
    Placeholder(DashboardView),
}

/// A role's dashboard, ready to load
#[derive(Debug)]
pub enum Dashboard {
    Student(StudentDashboard),
    Teacher(TeacherDashboard),
    Committee(CommitteeDashboard),
}

impl Dashboard {
    /// Build the dashboard the router picks for `state`
    pub fn open(store: &StoreService, state: &AuthState, features: &FeaturesConfig, timeout: Duration) -> Result<Opened> {
        let view = route_dashboard(state);
        let profile = match state.profile() {
            Some(profile) => profile.clone(),
            None => return Ok(Opened::Placeholder(view)),
        };

        let dashboard = match view {
            DashboardView::Student => Dashboard::Student(StudentDashboard::new(store.clone(), profile, timeout)?),
            DashboardView::Teacher => Dashboard::Teacher(TeacherDashboard::new(store.clone(), profile, timeout)?),
            DashboardView::Committee => {
                Dashboard::Committee(CommitteeDashboard::new(store.clone(), profile, features, timeout)?)
            }
            other => return Ok(Opened::Placeholder(other)),
        };
        Ok(Opened::Ready(dashboard))
    }

    pub async fn load(&mut self) -> Result<()> {
        match self {
            Dashboard::Student(d) => d.load().await,
            Dashboard::Teacher(d) => d.load().await,
            Dashboard::Committee(d) => d.load().await,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Dashboard::Student(d) => d.render(),
            Dashboard::Teacher(d) => d.render(),
            Dashboard::Committee(d) => d.render(),
        }
    }

    pub fn close(&self) {
        match self {
            Dashboard::Student(d) => d.close(),
            Dashboard::Teacher(d) => d.close(),
            Dashboard::Committee(d) => d.close(),
        }
    }
}
