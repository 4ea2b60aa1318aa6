//! Store service layer
//!
//! This module provides a high-level interface to the remote store. Read
//! helpers log failures and fall back to an empty result so that a broken
//! panel renders empty instead of taking the dashboard down; write helpers
//! return the error for the caller to show.

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::debug;
use uuid::Uuid;
use crate::models::*;
use crate::store::auth::AuthClient;
use crate::store::connection::{RemoteClient, StoreConfig};
use crate::store::repositories::*;
use crate::utils::errors::Result;
use crate::utils::logging::{log_api_error, log_event_action, log_user_action};

#[derive(Debug, Clone)]
pub struct StoreService {
    pub client: RemoteClient,
    pub auth: AuthClient,
    pub users: UserRepository,
    pub role_profiles: RoleProfileRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub attendance: AttendanceRepository,
    pub payments: PaymentRepository,
    pub notifications: NotificationRepository,
    pub settings: SettingsRepository,
}

impl StoreService {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            auth: AuthClient::new(client.clone()),
            users: UserRepository::new(client.clone()),
            role_profiles: RoleProfileRepository::new(client.clone()),
            events: EventRepository::new(client.clone()),
            registrations: RegistrationRepository::new(client.clone()),
            attendance: AttendanceRepository::new(client.clone()),
            payments: PaymentRepository::new(client.clone()),
            notifications: NotificationRepository::new(client.clone()),
            settings: SettingsRepository::new(client.clone()),
            client,
        }
    }

    /// Build the client and the service from connection settings
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(RemoteClient::new(config)?))
    }

    /// All events, empty on failure
    pub async fn fetch_events(&self) -> Vec<Event> {
        self.events.list().await.unwrap_or_else(|e| {
            log_api_error("events.list", &e, None);
            Vec::new()
        })
    }

    /// Upcoming events, empty on failure
    pub async fn fetch_upcoming_events(&self, today: NaiveDate) -> Vec<Event> {
        self.events.list_upcoming(today).await.unwrap_or_else(|e| {
            log_api_error("events.list_upcoming", &e, None);
            Vec::new()
        })
    }

    /// Events organized by a user, empty on failure
    pub async fn fetch_organized_events(&self, organizer_id: Uuid) -> Vec<Event> {
        self.events.list_by_organizer(organizer_id).await.unwrap_or_else(|e| {
            log_api_error("events.list_by_organizer", &e, Some(&organizer_id.to_string()));
            Vec::new()
        })
    }

    /// Registrations for a set of events, empty on failure
    pub async fn fetch_event_registrations(&self, event_ids: &[Uuid]) -> Vec<Registration> {
        self.registrations.list_for_events(event_ids).await.unwrap_or_else(|e| {
            log_api_error("registrations.list_for_events", &e, None);
            Vec::new()
        })
    }

    /// A user's registrations, empty on failure
    pub async fn fetch_user_registrations(&self, user_id: Uuid) -> Vec<Registration> {
        self.registrations.list_for_user(user_id).await.unwrap_or_else(|e| {
            log_api_error("registrations.list_for_user", &e, Some(&user_id.to_string()));
            Vec::new()
        })
    }

    /// Create a pending registration
    pub async fn create_registration(&self, user_id: Uuid, event_id: Uuid) -> Result<Registration> {
        let result = self
            .registrations
            .create(CreateRegistrationRequest::pending(user_id, event_id))
            .await;

        match &result {
            Ok(registration) => log_event_action(event_id, "register", user_id, Some(&registration.id.to_string())),
            Err(e) => log_api_error("registrations.create", e, Some(&event_id.to_string())),
        }
        result
    }

    /// Update profile fields
    pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> Result<Profile> {
        let result = self.users.update(user_id, request).await;
        match &result {
            Ok(_) => log_user_action(user_id, "update_profile", None),
            Err(e) => log_api_error("users.update", e, Some(&user_id.to_string())),
        }
        result
    }

    /// Settings of a user; a missing row and a failed read both yield `None`
    pub async fn get_settings(&self, user_id: Uuid) -> Option<UserSettings> {
        match self.settings.find_by_user(user_id).await {
            Ok(settings) => settings,
            Err(e) => {
                log_api_error("settings.find_by_user", &e, Some(&user_id.to_string()));
                None
            }
        }
    }

    /// Replace a user's preferences
    pub async fn save_settings(&self, user_id: Uuid, preferences: Preferences) -> Result<UserSettings> {
        let result = self.settings.upsert(user_id, preferences).await;
        match &result {
            Ok(_) => log_user_action(user_id, "save_settings", None),
            Err(e) => log_api_error("settings.upsert", e, Some(&user_id.to_string())),
        }
        result
    }

    /// Notifications for a user, empty on failure
    pub async fn fetch_notifications(&self, user_id: Uuid) -> Vec<Notification> {
        self.notifications.list_for_user(user_id).await.unwrap_or_else(|e| {
            log_api_error("notifications.list_for_user", &e, None);
            Vec::new()
        })
    }

    /// Payments for a set of events, empty on failure
    pub async fn fetch_event_payments(&self, event_ids: &[Uuid]) -> Vec<Payment> {
        self.payments.list_for_events(event_ids).await.unwrap_or_else(|e| {
            log_api_error("payments.list_for_events", &e, None);
            Vec::new()
        })
    }

    /// Every profile joined with its role extension, newest first
    ///
    /// Extension lookups run concurrently; a failed lookup leaves that
    /// profile without details.
    pub async fn fetch_detailed_profiles(&self) -> Result<Vec<DetailedProfile>> {
        let profiles = self.users.list().await?;
        debug!(count = profiles.len(), "Loading role details for profiles");

        let lookups = profiles.iter().map(|profile| self.role_profiles.details_for(profile));
        let details = join_all(lookups).await;

        Ok(profiles
            .into_iter()
            .zip(details)
            .map(|(profile, details)| {
                let details = details.unwrap_or_else(|e| {
                    log_api_error("role_profiles.details_for", &e, Some(&profile.id.to_string()));
                    None
                });
                DetailedProfile { profile, details }
            })
            .collect())
    }
}
