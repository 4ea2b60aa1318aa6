//! Per-user settings model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Free-form preference bag
pub type Preferences = serde_json::Map<String, serde_json::Value>;

/// Row of `settings`; at most one per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertSettingsRequest {
    pub user_id: Uuid,
    pub preferences: Preferences,
    pub updated_at: DateTime<Utc>,
}
