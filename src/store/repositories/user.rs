//! Profile repository implementation

use chrono::Utc;
use uuid::Uuid;
use crate::models::user::{Profile, Role, CreateProfileRequest, UpdateProfileRequest};
use crate::store::connection::RemoteClient;
use crate::store::query::RowQuery;
use crate::utils::errors::{CampusError, Result};

const TABLE: &str = "users";

#[derive(Clone, Debug)]
pub struct UserRepository {
    client: RemoteClient,
}

impl UserRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Create the profile row for a fresh credential
    pub async fn create(&self, request: CreateProfileRequest) -> Result<Profile> {
        self.client.insert(TABLE, &request).await
    }

    /// Find profile by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        self.client.select_one(RowQuery::table(TABLE).eq("id", id)).await
    }

    /// Update profile fields; unset fields are left alone
    pub async fn update(&self, id: Uuid, request: UpdateProfileRequest) -> Result<Profile> {
        if request.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| CampusError::NotFound { entity: "profile", id: id.to_string() });
        }

        let mut body = serde_json::to_value(&request)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
        }
        self.client.update_by_id(TABLE, id, &body).await
    }

    /// All profiles, newest first
    pub async fn list(&self) -> Result<Vec<Profile>> {
        self.client
            .select(&RowQuery::table(TABLE).order("created_at", false))
            .await
    }

    /// Profiles with a given role, newest first
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<Profile>> {
        self.client
            .select(&RowQuery::table(TABLE).eq("role", role).order("created_at", false))
            .await
    }
}
