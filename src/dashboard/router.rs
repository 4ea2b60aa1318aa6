//! Role dispatch and route gating

use std::fmt;
use std::str::FromStr;
use crate::models::{Role, RoleTag};
use crate::state::AuthState;
use crate::utils::errors::CampusError;

/// Which dashboard to show for the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    Loading,
    Student,
    Teacher,
    Committee,
    /// Stored role this build does not know
    UnknownRole(String),
    ProfileMissing,
}

impl DashboardView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Student => DashboardView::Student,
            Role::Teacher => DashboardView::Teacher,
            Role::Committee => DashboardView::Committee,
        }
    }

    /// Text shown instead of a dashboard, if any
    pub fn notice(&self) -> Option<String> {
        match self {
            DashboardView::Loading => Some("Loading...".to_string()),
            DashboardView::UnknownRole(role) => Some(format!("Unknown role: {}", role)),
            DashboardView::ProfileMissing => {
                Some("Your account has no profile yet. Please contact the event committee.".to_string())
            }
            DashboardView::Student | DashboardView::Teacher | DashboardView::Committee => None,
        }
    }
}

/// Pick the dashboard for the resolved state; no side effects.
///
/// A signed-out state maps to `Loading`: the route gate redirects before a
/// dashboard is ever rendered without a session.
pub fn route_dashboard(state: &AuthState) -> DashboardView {
    match state {
        AuthState::Loading | AuthState::SignedOut => DashboardView::Loading,
        AuthState::ProfileMissing { .. } => DashboardView::ProfileMissing,
        AuthState::SignedIn(profile) => match &profile.role {
            RoleTag::Known(role) => DashboardView::for_role(*role),
            RoleTag::Unknown(raw) => DashboardView::UnknownRole(raw.clone()),
        },
    }
}

/// Top-level routes of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Auth,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Auth => "/auth",
            Route::Dashboard => "/dashboard",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches('/') {
            "" => Ok(Route::Root),
            "/auth" => Ok(Route::Auth),
            "/dashboard" => Ok(Route::Dashboard),
            other => Err(CampusError::InvalidInput(format!("Unknown route: {}", other))),
        }
    }
}

/// Outcome of gating a route against the auth state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The initial session check is still running
    Wait,
    Render(Route),
    Redirect(Route),
}

pub fn gate(route: Route, state: &AuthState) -> RouteDecision {
    if state.is_loading() {
        return RouteDecision::Wait;
    }

    let signed_in = state.has_session();
    match route {
        Route::Root if signed_in => RouteDecision::Redirect(Route::Dashboard),
        Route::Root => RouteDecision::Redirect(Route::Auth),
        Route::Auth if signed_in => RouteDecision::Redirect(Route::Dashboard),
        Route::Auth => RouteDecision::Render(Route::Auth),
        Route::Dashboard if signed_in => RouteDecision::Render(Route::Dashboard),
        Route::Dashboard => RouteDecision::Redirect(Route::Auth),
    }
}
