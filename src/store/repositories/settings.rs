//! Per-user settings repository

use chrono::Utc;
use uuid::Uuid;
use crate::models::settings::{Preferences, UpsertSettingsRequest, UserSettings};
use crate::store::connection::RemoteClient;
use crate::store::query::RowQuery;
use crate::utils::errors::Result;

const TABLE: &str = "settings";

#[derive(Clone, Debug)]
pub struct SettingsRepository {
    client: RemoteClient,
}

impl SettingsRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// A user without a settings row is not an error
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<UserSettings>> {
        self.client
            .select_one(RowQuery::table(TABLE).eq("user_id", user_id))
            .await
    }

    /// Insert or replace the user's preference bag
    pub async fn upsert(&self, user_id: Uuid, preferences: Preferences) -> Result<UserSettings> {
        let request = UpsertSettingsRequest {
            user_id,
            preferences,
            updated_at: Utc::now(),
        };
        self.client.upsert(TABLE, &request, "user_id").await
    }
}
