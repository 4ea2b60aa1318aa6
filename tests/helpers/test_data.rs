//! Test data helpers for creating rows as the service stores them

use serde_json::{json, Value};
use uuid::Uuid;

pub const ALICE_EMAIL: &str = "alice@campus.edu";
pub const ALICE_PASSWORD: &str = "alice-secret";

/// Row of the `users` table
pub fn profile_row(id: Uuid, email: &str, role: &str, name: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "role": role,
        "name": name,
        "bio": null,
        "phone": null,
        "branch": null,
        "year": null,
        "roll_number": null
    })
}

/// Row of the `events` table
pub fn event_row(name: &str, date: &str, organizer_id: Option<Uuid>) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "name": name,
        "description": format!("{} for all new students", name),
        "date": date,
        "time": "10:00",
        "location": "Main Hall",
        "organizer_id": organizer_id
    })
}

/// Row of the `registrations` table
pub fn registration_row(user_id: Uuid, event_id: Uuid, status: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "user_id": user_id,
        "event_id": event_id,
        "status": status
    })
}

/// Id of a seeded row
pub fn row_id(row: &Value) -> Uuid {
    row["id"].as_str().and_then(|id| id.parse().ok()).expect("row has a uuid id")
}
