//! Test helpers module
//!
//! This module provides the mock hosted service and row builders shared by
//! the integration tests.

#![allow(dead_code)]

pub mod service_mock;
pub mod test_data;

pub use service_mock::*;
pub use test_data::*;

use std::time::Duration;
use campus_events::config::FeaturesConfig;
use campus_events::state::{AuthContext, AuthState};

/// Upper bound for anything the tests wait on
pub const WAIT: Duration = Duration::from_secs(5);

/// Standard tables with the constraints the bundled schema declares
pub async fn mount_tables(mock: &ServiceMock) -> Tables {
    Tables {
        users: mock.table("users", &[]).await,
        events: mock.table("events", &[]).await,
        registrations: mock.table("registrations", &[&["user_id", "event_id"]]).await,
        notifications: mock.table("notifications", &[]).await,
        attendance: mock.table("attendance", &[]).await,
        payments: mock.table("payments", &[]).await,
        settings: mock.table("settings", &[&["user_id"]]).await,
    }
}

pub struct Tables {
    pub users: FakeTable,
    pub events: FakeTable,
    pub registrations: FakeTable,
    pub notifications: FakeTable,
    pub attendance: FakeTable,
    pub payments: FakeTable,
    pub settings: FakeTable,
}

/// Start a context against the mock and wait for the initial check
pub async fn start_context(mock: &ServiceMock, features: FeaturesConfig) -> AuthContext {
    let context = AuthContext::start(mock.store(), features);
    tokio::time::timeout(WAIT, context.wait_resolved())
        .await
        .expect("initial session check settles");
    context
}

/// Log in and wait for the listener to resolve the session
pub async fn login(context: &AuthContext, email: &str, password: &str) -> AuthState {
    context.login(email, password).await.expect("login succeeds");
    tokio::time::timeout(WAIT, context.wait_until(AuthState::has_session))
        .await
        .expect("session resolves")
}
