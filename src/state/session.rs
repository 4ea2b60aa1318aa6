//! Resolved identity of the current session

use uuid::Uuid;
use crate::models::{Profile, Role};

/// What the application knows about the signed-in user
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// The initial session check has not finished yet
    Loading,
    SignedOut,
    SignedIn(Profile),
    /// A valid session whose `users` row is absent or unreadable
    ProfileMissing { user_id: Uuid, email: Option<String> },
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    /// Signed in as far as route gating is concerned, with or without a profile
    pub fn has_session(&self) -> bool {
        matches!(self, AuthState::SignedIn(_) | AuthState::ProfileMissing { .. })
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            AuthState::SignedIn(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthState::SignedIn(profile) => Some(profile.id),
            AuthState::ProfileMissing { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.profile().and_then(|p| p.role.role())
    }
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::Loading
    }
}
