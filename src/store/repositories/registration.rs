//! Registration repository implementation

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use crate::models::registration::{Registration, RegistrationStatus, CreateRegistrationRequest};
use crate::store::connection::RemoteClient;
use crate::store::query::RowQuery;
use crate::utils::errors::{CampusError, Result};

const TABLE: &str = "registrations";

#[derive(Clone, Debug)]
pub struct RegistrationRepository {
    client: RemoteClient,
}

impl RegistrationRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Insert a registration; a second one for the same (user, event)
    /// fails with a unique violation
    pub async fn create(&self, request: CreateRegistrationRequest) -> Result<Registration> {
        self.client.insert(TABLE, &request).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        self.client.select_one(RowQuery::table(TABLE).eq("id", id)).await
    }

    /// Registrations of one user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>> {
        self.client
            .select(&RowQuery::table(TABLE).eq("user_id", user_id).order("created_at", false))
            .await
    }

    /// Registrations for one event, oldest first
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        self.client
            .select(&RowQuery::table(TABLE).eq("event_id", event_id).order("created_at", true))
            .await
    }

    /// Registrations for any of the given events
    pub async fn list_for_events(&self, event_ids: &[Uuid]) -> Result<Vec<Registration>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&RowQuery::table(TABLE).in_list("event_id", event_ids).order("created_at", true))
            .await
    }

    /// Move a registration from `from` to `to`.
    ///
    /// The write only applies while the stored status is still `from`, so a
    /// registration decided elsewhere in the meantime is left alone and the
    /// call fails with `InvalidStateTransition`.
    pub async fn update_status(
        &self,
        id: Uuid,
        from: RegistrationStatus,
        to: RegistrationStatus,
    ) -> Result<Registration> {
        from.transition(to)?;
        let body = json!({ "status": to, "updated_at": Utc::now() });
        let query = RowQuery::table(TABLE).eq("id", id).eq("status", from.as_str());
        let mut rows: Vec<Registration> = self.client.update_where(&query, &body).await?;
        if !rows.is_empty() {
            return Ok(rows.swap_remove(0));
        }

        match self.find_by_id(id).await? {
            Some(current) => Err(CampusError::InvalidStateTransition {
                from: current.status.as_str().to_string(),
                to: to.as_str().to_string(),
            }),
            None => Err(CampusError::NotFound { entity: TABLE, id: id.to_string() }),
        }
    }
}
