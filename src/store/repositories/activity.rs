//! Attendance and payment repositories

use uuid::Uuid;
use crate::models::activity::{Attendance, RecordAttendanceRequest, Payment, CreatePaymentRequest};
use crate::store::connection::RemoteClient;
use crate::store::query::RowQuery;
use crate::utils::errors::Result;

#[derive(Clone, Debug)]
pub struct AttendanceRepository {
    client: RemoteClient,
}

impl AttendanceRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Record or overwrite the attendance mark of a user at an event
    pub async fn record(&self, request: RecordAttendanceRequest) -> Result<Attendance> {
        self.client.upsert("attendance", &request, "user_id,event_id").await
    }

    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Attendance>> {
        self.client
            .select(&RowQuery::table("attendance").eq("event_id", event_id))
            .await
    }
}

#[derive(Clone, Debug)]
pub struct PaymentRepository {
    client: RemoteClient,
}

impl PaymentRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: CreatePaymentRequest) -> Result<Payment> {
        self.client.insert("payments", &request).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        self.client
            .select(&RowQuery::table("payments").eq("user_id", user_id).order("created_at", false))
            .await
    }

    pub async fn list_for_events(&self, event_ids: &[Uuid]) -> Result<Vec<Payment>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&RowQuery::table("payments").in_list("event_id", event_ids).order("created_at", false))
            .await
    }
}
