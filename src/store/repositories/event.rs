//! Event repository implementation

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use crate::models::event::{Event, CreateEventRequest, UpdateEventRequest};
use crate::store::connection::RemoteClient;
use crate::store::query::RowQuery;
use crate::utils::errors::Result;

const TABLE: &str = "events";

#[derive(Clone, Debug)]
pub struct EventRepository {
    client: RemoteClient,
}

impl EventRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event> {
        self.client.insert(TABLE, &request).await
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        self.client.select_one(RowQuery::table(TABLE).eq("id", id)).await
    }

    /// Update event
    pub async fn update(&self, id: Uuid, request: UpdateEventRequest) -> Result<Event> {
        let mut body = serde_json::to_value(&request)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
        }
        self.client.update_by_id(TABLE, id, &body).await
    }

    /// All events by date
    pub async fn list(&self) -> Result<Vec<Event>> {
        self.client
            .select(&RowQuery::table(TABLE).order("date", true).order("time", true))
            .await
    }

    /// Events on or after the given day
    pub async fn list_upcoming(&self, today: NaiveDate) -> Result<Vec<Event>> {
        self.client
            .select(
                &RowQuery::table(TABLE)
                    .gte("date", today)
                    .order("date", true)
                    .order("time", true),
            )
            .await
    }

    /// Events organized by a user
    pub async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>> {
        self.client
            .select(
                &RowQuery::table(TABLE)
                    .eq("organizer_id", organizer_id)
                    .order("date", true),
            )
            .await
    }
}
