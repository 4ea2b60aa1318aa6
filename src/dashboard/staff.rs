//! Actions shared by the teacher and committee dashboards

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;
use crate::middleware::{Permission, RoleGuard};
use crate::models::*;
use crate::store::StoreService;
use crate::utils::errors::{CampusError, Result};
use crate::utils::logging::{log_api_error, log_event_action};
use super::scope::ViewScope;
use super::Notice;

/// Fields a staff member fills in to create an event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
}

impl NewEvent {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CampusError::InvalidInput("Event name is required".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(CampusError::InvalidInput("Event location is required".to_string()));
        }
        Ok(())
    }
}

/// Events, their registrations and the actions staff take on them
#[derive(Debug, Default)]
pub struct EventBoard {
    pub events: Vec<Event>,
    pub registrations: Vec<Registration>,
    pub payments: Vec<Payment>,
    pub notice: Option<Notice>,
}

impl EventBoard {
    pub fn event(&self, event_id: Uuid) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn event_ids(&self) -> Vec<Uuid> {
        self.events.iter().map(|e| e.id).collect()
    }

    pub fn registrations_for(&self, event_id: Uuid) -> Vec<&Registration> {
        self.registrations.iter().filter(|r| r.event_id == event_id).collect()
    }

    pub fn pending(&self) -> Vec<&Registration> {
        self.registrations
            .iter()
            .filter(|r| r.status == RegistrationStatus::Pending)
            .collect()
    }

    pub fn pending_count(&self, event_id: Uuid) -> usize {
        self.registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Pending)
            .count()
    }

    fn locate(&self, registration_id: Uuid) -> Result<(&Registration, &Event)> {
        let registration = self
            .registrations
            .iter()
            .find(|r| r.id == registration_id)
            .ok_or_else(|| CampusError::NotFound { entity: "registration", id: registration_id.to_string() })?;
        let event = self
            .event(registration.event_id)
            .ok_or_else(|| CampusError::NotFound { entity: "event", id: registration.event_id.to_string() })?;
        Ok((registration, event))
    }

    /// Re-read registrations and payments for the listed events
    pub async fn reload_activity(&mut self, store: &StoreService, scope: &ViewScope) -> Result<()> {
        let ids = self.event_ids();
        let (registrations, payments) = scope
            .guard(async {
                futures::join!(store.fetch_event_registrations(&ids), store.fetch_event_payments(&ids))
            })
            .await?;
        self.registrations = registrations;
        self.payments = payments;
        Ok(())
    }

    /// Approve or reject a pending registration, then re-read the list.
    ///
    /// The student is notified on a best-effort basis. When the list cannot
    /// be re-read the previous one stays and a notice says so.
    pub async fn review(
        &mut self,
        store: &StoreService,
        scope: &ViewScope,
        reviewer: &Profile,
        registration_id: Uuid,
        decision: RegistrationStatus,
    ) -> Result<Registration> {
        let (registration, event) = self.locate(registration_id)?;
        RoleGuard::new(reviewer).require_event_authority(event)?;
        let current = registration.status;
        let next = current.transition(decision)?;
        let student_id = registration.user_id;
        let event_id = event.id;
        let event_name = event.name.clone();

        let updated = match scope.run(store.registrations.update_status(registration_id, current, next)).await {
            Ok(updated) => updated,
            Err(e @ CampusError::InvalidStateTransition { .. }) => {
                warn!(registration_id = %registration_id, error = %e, "Registration was decided elsewhere");
                self.refresh_registrations(store, scope).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        log_event_action(event_id, next.as_str(), reviewer.id, Some(&registration_id.to_string()));

        let notification = CreateNotificationRequest {
            user_id: student_id,
            title: format!("Registration {}", next.label()),
            message: format!("Your registration for {} was {}.", event_name, next.as_str()),
        };
        if let Err(e) = scope.run(store.notifications.create(notification)).await {
            log_api_error("notifications.create", &e, Some(&student_id.to_string()));
        }

        self.notice = if self.refresh_registrations(store, scope).await? {
            None
        } else {
            Some(Notice::Info(format!(
                "Registration {}, but the list could not be refreshed.",
                next.as_str()
            )))
        };
        Ok(updated)
    }

    /// Re-read registrations for the listed events; `false` when the read
    /// failed and the previous list was kept
    async fn refresh_registrations(&mut self, store: &StoreService, scope: &ViewScope) -> Result<bool> {
        let ids = self.event_ids();
        match scope.run(store.registrations.list_for_events(&ids)).await {
            Ok(registrations) => {
                self.registrations = registrations;
                Ok(true)
            }
            Err(CampusError::Cancelled) => Err(CampusError::Cancelled),
            Err(e) => {
                log_api_error("registrations.list_for_events", &e, None);
                Ok(false)
            }
        }
    }

    /// Mark attendance for an approved registration
    pub async fn record_attendance(
        &self,
        store: &StoreService,
        scope: &ViewScope,
        reviewer: &Profile,
        registration_id: Uuid,
        status: AttendanceStatus,
    ) -> Result<Attendance> {
        let guard = RoleGuard::new(reviewer);
        guard.require(Permission::RecordAttendance)?;
        let (registration, event) = self.locate(registration_id)?;
        guard.require_event_authority(event)?;

        if registration.status != RegistrationStatus::Approved {
            return Err(CampusError::InvalidInput(format!(
                "Attendance can only be recorded for approved registrations (currently {})",
                registration.status.label()
            )));
        }

        let request = RecordAttendanceRequest {
            user_id: registration.user_id,
            event_id: event.id,
            status,
        };
        let attendance = scope.run(store.attendance.record(request)).await?;
        log_event_action(event.id, "attendance", reviewer.id, Some(status.label()));
        Ok(attendance)
    }

    /// Create an event organized by `organizer` and add it to the board
    pub async fn create_event(
        &mut self,
        store: &StoreService,
        scope: &ViewScope,
        organizer: &Profile,
        event: NewEvent,
    ) -> Result<Event> {
        RoleGuard::new(organizer).require(Permission::CreateEvents)?;
        event.validate()?;

        let request = CreateEventRequest {
            name: event.name.trim().to_string(),
            description: event.description,
            date: event.date,
            time: event.time,
            location: event.location.trim().to_string(),
            organizer_id: Some(organizer.id),
        };
        let created = scope.run(store.events.create(request)).await?;
        log_event_action(created.id, "create", organizer.id, Some(&created.name));

        self.events.push(created.clone());
        self.events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        debug!(events = self.events.len(), "Event board updated");
        Ok(created)
    }
}

/// Mark a notification as read, replacing it in `notifications`
pub async fn mark_notification_read(
    store: &StoreService,
    scope: &ViewScope,
    notifications: &mut [Notification],
    notification_id: Uuid,
) -> Result<()> {
    let updated = scope.run(store.notifications.mark_read(notification_id)).await?;
    match notifications.iter_mut().find(|n| n.id == notification_id) {
        Some(slot) => *slot = updated,
        None => warn!(notification_id = %notification_id, "Marked a notification that is not listed"),
    }
    Ok(())
}
