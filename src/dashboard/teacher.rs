//! Teacher dashboard: the teacher's own events and their registrations

use std::fmt::Write as _;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;
use crate::middleware::{Permission, RoleGuard};
use crate::models::*;
use crate::store::StoreService;
use crate::utils::errors::Result;
use crate::utils::helpers::format_event_date;
use super::scope::ViewScope;
use super::staff::{mark_notification_read, EventBoard, NewEvent};

#[derive(Debug)]
pub struct TeacherDashboard {
    store: StoreService,
    profile: Profile,
    scope: ViewScope,
    board: EventBoard,
    notifications: Vec<Notification>,
}

impl TeacherDashboard {
    pub fn new(store: StoreService, profile: Profile, timeout: Duration) -> Result<Self> {
        RoleGuard::new(&profile).require(Permission::ReviewRegistrations)?;
        Ok(Self {
            store,
            profile,
            scope: ViewScope::new(timeout),
            board: EventBoard::default(),
            notifications: Vec::new(),
        })
    }

    pub fn board(&self) -> &EventBoard {
        &self.board
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    /// Organized events first, then their registrations, payments and the
    /// teacher's notifications concurrently
    pub async fn load(&mut self) -> Result<()> {
        let store = &self.store;
        let user_id = self.profile.id;

        let events = self.scope.guard(store.fetch_organized_events(user_id)).await?;
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let (registrations, payments, notifications) = self
            .scope
            .guard(async {
                futures::join!(
                    store.fetch_event_registrations(&ids),
                    store.fetch_event_payments(&ids),
                    store.fetch_notifications(user_id)
                )
            })
            .await?;

        info!(user_id = %user_id, events = events.len(), registrations = registrations.len(), "Teacher dashboard loaded");
        self.board = EventBoard { events, registrations, payments, notice: None };
        self.notifications = notifications;
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

    pub async fn mark_notification_read(&mut self, notification_id: Uuid) -> Result<()> {
        mark_notification_read(&self.store, &self.scope, &mut self.notifications, notification_id).await
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", Role::Teacher.dashboard_title());
        let _ = writeln!(out, "Welcome, {}", self.profile.display_name());
        if let Some(notice) = &self.board.notice {
            let _ = writeln!(out, "{}", notice);
        }

        let _ = writeln!(out, "\nMy Events");
        if self.board.events.is_empty() {
            let _ = writeln!(out, "  You are not organizing any events.");
        }
        for event in &self.board.events {
            let _ = writeln!(
                out,
                "  {} | {} {} | {} registrations, {} pending",
                event.name,
                format_event_date(event.date),
                event.time,
                self.board.registrations_for(event.id).len(),
                self.board.pending_count(event.id)
            );
        }

        let _ = writeln!(out, "\nPayments");
        if self.board.payments.is_empty() {
            let _ = writeln!(out, "  No payments recorded.");
        }
        for payment in &self.board.payments {
            let _ = writeln!(out, "  {} | {:.2} | {}", payment.user_id, payment.amount, payment.payment_status.label());
        }

        let _ = writeln!(out, "\nNotifications ({} unread)", self.unread_count());
        for notification in &self.notifications {
            let marker = if notification.is_read { " " } else { "*" };
            let _ = writeln!(out, " {} {}: {}", marker, notification.title, notification.message);
        }
        out
    }
}
