//! Student dashboard: upcoming events and the registration flow

use std::fmt::Write as _;
use std::time::Duration;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use crate::middleware::{Permission, RoleGuard};
use crate::models::{Event, Profile, Registration, RegistrationStatus, Role};
use crate::store::StoreService;
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::{format_event_date, truncate_text};
use crate::utils::logging::log_api_error;
use super::scope::ViewScope;
use super::Notice;

/// Button shown next to an upcoming event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    RegisterNow,
    AlreadyRegistered,
}

impl EventAction {
    pub fn label(&self) -> &'static str {
        match self {
            EventAction::RegisterNow => "Register Now",
            EventAction::AlreadyRegistered => "Already Registered",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventCard<'a> {
    pub event: &'a Event,
    pub action: EventAction,
    pub status: Option<RegistrationStatus>,
}

/// Row of the registration status panel
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub event_id: Uuid,
    pub event_name: Option<String>,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Registered(Registration),
    /// Already registered, either known locally or reported by the service
    AlreadyRegistered,
    /// The notice text shown to the student
    Failed(String),
}

#[derive(Debug)]
pub struct StudentDashboard {
    store: StoreService,
    profile: Profile,
    scope: ViewScope,
    today: NaiveDate,
    events: Vec<Event>,
    registrations: Vec<Registration>,
    notice: Option<Notice>,
}

impl StudentDashboard {
    pub fn new(store: StoreService, profile: Profile, timeout: Duration) -> Result<Self> {
        RoleGuard::new(&profile).require(Permission::RegisterForEvents)?;
        Ok(Self {
            store,
            profile,
            scope: ViewScope::new(timeout),
            today: Utc::now().date_naive(),
            events: Vec::new(),
            registrations: Vec::new(),
            notice: None,
        })
    }

    /// Pin the date that separates upcoming from past events
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Fetch upcoming events and the student's registrations side by side.
    ///
    /// A failed panel loads empty; only cancellation and timeout are errors.
    pub async fn load(&mut self) -> Result<()> {
        let store = &self.store;
        let (events, registrations) = self
            .scope
            .guard(async {
                futures::join!(
                    store.fetch_upcoming_events(self.today),
                    store.fetch_user_registrations(self.profile.id)
                )
            })
            .await?;

        info!(
            user_id = %self.profile.id,
            events = events.len(),
            registrations = registrations.len(),
            "Student dashboard loaded"
        );
        self.events = events;
        self.registrations = registrations;
        Ok(())
    }

    pub fn registration_for(&self, event_id: Uuid) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.event_id == event_id)
    }

    pub fn is_registered(&self, event_id: Uuid) -> bool {
        self.registration_for(event_id).is_some()
    }

    pub fn upcoming(&self) -> Vec<EventCard<'_>> {
        self.events
            .iter()
            .filter(|event| event.is_upcoming(self.today))
            .map(|event| {
                let status = self.registration_for(event.id).map(|r| r.status);
                EventCard {
                    event,
                    action: if status.is_some() { EventAction::AlreadyRegistered } else { EventAction::RegisterNow },
                    status,
                }
            })
            .collect()
    }

    pub fn status_panel(&self) -> Vec<StatusEntry> {
        self.registrations
            .iter()
            .map(|registration| StatusEntry {
                event_id: registration.event_id,
                event_name: self
                    .events
                    .iter()
                    .find(|e| e.id == registration.event_id)
                    .map(|e| e.name.clone()),
                status: registration.status,
            })
            .collect()
    }

    /// Register the student for an event.
    ///
    /// A known registration short-circuits without a request. A duplicate
    /// reported by the service counts as already registered. Any other
    /// failure leaves the registration list untouched and sets a notice.
    pub async fn register(&mut self, event_id: Uuid) -> Result<RegisterOutcome> {
        if self.is_registered(event_id) {
            self.notice = Some(Notice::Info("You are already registered for this event.".to_string()));
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        let event_name = match self.events.iter().find(|e| e.id == event_id) {
            Some(event) => event.name.clone(),
            None => {
                let message = "Registration failed: event is not open for registration".to_string();
                self.notice = Some(Notice::Error(message.clone()));
                return Ok(RegisterOutcome::Failed(message));
            }
        };

        let created = self
            .scope
            .run(self.store.create_registration(self.profile.id, event_id))
            .await;

        match created {
            Ok(registration) => {
                self.notice = Some(if self.refresh_registrations().await? {
                    Notice::Success(format!("Successfully registered for {}!", event_name))
                } else {
                    Notice::Info(format!(
                        "Registered for {}, but the list could not be refreshed.",
                        event_name
                    ))
                });
                Ok(RegisterOutcome::Registered(registration))
            }
            Err(CampusError::Cancelled) => Err(CampusError::Cancelled),
            Err(CampusError::UniqueViolation(_)) => {
                info!(user_id = %self.profile.id, event_id = %event_id, "Registration already exists remotely");
                self.refresh_registrations().await?;
                self.notice = Some(Notice::Info("You are already registered for this event.".to_string()));
                Ok(RegisterOutcome::AlreadyRegistered)
            }
            Err(e) => {
                let message = format!("Registration failed: {}", e.user_message());
                self.notice = Some(Notice::Error(message.clone()));
                Ok(RegisterOutcome::Failed(message))
            }
        }
    }

    /// Re-read the registration list; `false` when the read failed and the
    /// previous list was kept
    async fn refresh_registrations(&mut self) -> Result<bool> {
        let fetched = self
            .scope
            .run(self.store.registrations.list_for_user(self.profile.id))
            .await;

        match fetched {
            Ok(registrations) => {
                self.registrations = registrations;
                Ok(true)
            }
            Err(CampusError::Cancelled) => Err(CampusError::Cancelled),
            Err(e) => {
                log_api_error("registrations.list_for_user", &e, Some(&self.profile.id.to_string()));
                warn!(user_id = %self.profile.id, "Keeping previous registration list");
                Ok(false)
            }
        }
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", Role::Student.dashboard_title());
        let _ = writeln!(out, "Welcome, {}", self.profile.display_name());
        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "{}", notice);
        }

        let _ = writeln!(out, "\nUpcoming Events");
        let cards = self.upcoming();
        if cards.is_empty() {
            let _ = writeln!(out, "  No upcoming events.");
        }
        for card in cards {
            let _ = writeln!(
                out,
                "  {} | {} {} | {} [{}]",
                card.event.name,
                format_event_date(card.event.date),
                card.event.time,
                card.event.location,
                card.action.label()
            );
            if !card.event.description.is_empty() {
                let _ = writeln!(out, "    {}", truncate_text(&card.event.description, 80));
            }
        }

        let _ = writeln!(out, "\nRegistration Status");
        let entries = self.status_panel();
        if entries.is_empty() {
            let _ = writeln!(out, "  You have not registered for any events yet.");
        }
        for entry in entries {
            let name = entry.event_name.unwrap_or_else(|| entry.event_id.to_string());
            let _ = writeln!(out, "  {}: {}", name, entry.status.label());
        }
        out
    }
}
