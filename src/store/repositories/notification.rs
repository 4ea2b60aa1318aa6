//! Notification repository implementation

use serde_json::json;
use uuid::Uuid;
use crate::models::notification::{Notification, CreateNotificationRequest};
use crate::store::connection::RemoteClient;
use crate::store::query::RowQuery;
use crate::utils::errors::Result;

const TABLE: &str = "notifications";

#[derive(Clone, Debug)]
pub struct NotificationRepository {
    client: RemoteClient,
}

impl NotificationRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: CreateNotificationRequest) -> Result<Notification> {
        self.client.insert(TABLE, &request).await
    }

    /// Notifications for a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.client
            .select(&RowQuery::table(TABLE).eq("user_id", user_id).order("created_at", false))
            .await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Notification> {
        self.client.update_by_id(TABLE, id, &json!({ "is_read": true })).await
    }
}
