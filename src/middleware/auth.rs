//! Authorization checks
//!
//! Row-level policies on the service are the real boundary; these checks
//! stop a view from offering or attempting an action its role cannot
//! perform, and turn the attempt into a readable error.

use tracing::{debug, warn};
use crate::models::{Event, Profile, Role};
use crate::utils::errors::{CampusError, Result};

/// Actions a dashboard can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    RegisterForEvents,
    CreateEvents,
    /// Approve or reject registrations of events the user organizes
    ReviewRegistrations,
    /// Approve or reject any registration
    ReviewAllRegistrations,
    RecordAttendance,
    ViewSignupTracker,
}

impl Permission {
    /// Permissions granted to a role
    pub fn granted_to(role: Role) -> &'static [Permission] {
        match role {
            Role::Student => &[Permission::RegisterForEvents],
            Role::Teacher => &[
                Permission::CreateEvents,
                Permission::ReviewRegistrations,
                Permission::RecordAttendance,
            ],
            Role::Committee => &[
                Permission::CreateEvents,
                Permission::ReviewRegistrations,
                Permission::ReviewAllRegistrations,
                Permission::RecordAttendance,
                Permission::ViewSignupTracker,
            ],
        }
    }
}

/// Role checks for a signed-in profile
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard<'a> {
    profile: &'a Profile,
}

impl<'a> RoleGuard<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        Self { profile }
    }

    /// The profile's role; unknown stored roles have no permissions
    pub fn role(&self) -> Result<Role> {
        self.profile.role.role().ok_or_else(|| {
            CampusError::PermissionDenied(format!("Unknown role: {}", self.profile.role))
        })
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.role()
            .map(|role| Permission::granted_to(role).contains(&permission))
            .unwrap_or(false)
    }

    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.has(permission) {
            debug!(user_id = %self.profile.id, permission = ?permission, "Permission granted");
            Ok(())
        } else {
            warn!(user_id = %self.profile.id, role = %self.profile.role, permission = ?permission, "Permission denied");
            Err(CampusError::PermissionDenied(format!(
                "{} accounts cannot perform {:?}",
                self.profile.role, permission
            )))
        }
    }

    /// Whether the profile may review registrations of `event`
    pub fn require_event_authority(&self, event: &Event) -> Result<()> {
        if self.has(Permission::ReviewAllRegistrations) {
            return Ok(());
        }
        self.require(Permission::ReviewRegistrations)?;

        if event.is_organized_by(self.profile.id) {
            Ok(())
        } else {
            warn!(user_id = %self.profile.id, event_id = %event.id, "Not the organizer of this event");
            Err(CampusError::PermissionDenied(format!("Not the organizer of {}", event.name)))
        }
    }
}
