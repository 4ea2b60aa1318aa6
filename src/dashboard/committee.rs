//! Committee dashboard: every event, every registration, and the signup tracker

use std::fmt::Write as _;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;
use crate::config::FeaturesConfig;
use crate::middleware::{Permission, RoleGuard};
use crate::models::*;
use crate::store::StoreService;
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::format_event_date;
use super::scope::ViewScope;
use super::staff::{EventBoard, NewEvent};
use super::tracker::SignupTracker;

#[derive(Debug)]
pub struct CommitteeDashboard {
    store: StoreService,
    profile: Profile,
    scope: ViewScope,
    board: EventBoard,
    tracker_enabled: bool,
}

impl CommitteeDashboard {
    pub fn new(store: StoreService, profile: Profile, features: &FeaturesConfig, timeout: Duration) -> Result<Self> {
        RoleGuard::new(&profile).require(Permission::ReviewAllRegistrations)?;
        Ok(Self {
            store,
            profile,
            scope: ViewScope::new(timeout),
            board: EventBoard::default(),
            tracker_enabled: features.signup_tracker,
        })
    }

    pub fn board(&self) -> &EventBoard {
        &self.board
    }

    pub async fn load(&mut self) -> Result<()> {
        let events = self.scope.guard(self.store.fetch_events()).await?;
        self.board = EventBoard { events, ..Default::default() };
        self.board.reload_activity(&self.store, &self.scope).await?;

        info!(
            user_id = %self.profile.id,
            events = self.board.events.len(),
            pending = self.board.pending().len(),
            "Committee dashboard loaded"
        );
        Ok(())
    }

    pub async fn approve(&mut self, registration_id: Uuid) -> Result<Registration> {
        self.board
            .review(&self.store, &self.scope, &self.profile, registration_id, RegistrationStatus::Approved)
            .await
    }

    pub async fn reject(&mut self, registration_id: Uuid) -> Result<Registration> {
        self.board
            .review(&self.store, &self.scope, &self.profile, registration_id, RegistrationStatus::Rejected)
            .await
    }

    pub async fn mark_attendance(&self, registration_id: Uuid, status: AttendanceStatus) -> Result<Attendance> {
        self.board
            .record_attendance(&self.store, &self.scope, &self.profile, registration_id, status)
            .await
    }

    pub async fn create_event(&mut self, event: NewEvent) -> Result<Event> {
        self.board.create_event(&self.store, &self.scope, &self.profile, event).await
    }

    /// Open the signup tracker, when enabled
    pub fn signup_tracker(&self) -> Result<SignupTracker> {
        if !self.tracker_enabled {
            return Err(CampusError::PermissionDenied("The signup tracker is disabled".to_string()));
        }
        SignupTracker::new(self.store.clone(), &self.profile, self.scope.timeout())
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", Role::Committee.dashboard_title());
        let _ = writeln!(out, "Welcome, {}", self.profile.display_name());
        if let Some(notice) = &self.board.notice {
            let _ = writeln!(out, "{}", notice);
        }

        let _ = writeln!(out, "\nAll Events");
        if self.board.events.is_empty() {
            let _ = writeln!(out, "  No events yet.");
        }
        for event in &self.board.events {
            let _ = writeln!(
                out,
                "  {} | {} {} | {} | {} registrations, {} pending",
                event.name,
                format_event_date(event.date),
                event.time,
                event.location,
                self.board.registrations_for(event.id).len(),
                self.board.pending_count(event.id)
            );
        }

        let pending = self.board.pending();
        let _ = writeln!(out, "\nAwaiting Review ({})", pending.len());
        for registration in pending {
            let event = self
                .board
                .event(registration.event_id)
                .map(|e| e.name.as_str())
                .unwrap_or("Unknown event");
            let _ = writeln!(out, "  {} | {} | {}", registration.id, event, registration.user_id);
        }
        out
    }
}
