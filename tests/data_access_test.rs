//! Data-access helpers: settings, profile updates and read fallbacks

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use serde_json::json;
use uuid::Uuid;

use campus_events::config::FeaturesConfig;
use campus_events::models::{Preferences, UpdateProfileRequest};
use campus_events::store::{StoreConfig, StoreService};
use campus_events::CampusError;

fn preferences(value: serde_json::Value) -> Preferences {
    value.as_object().cloned().expect("object")
}

#[tokio::test]
async fn test_settings_round_trip_and_replace() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    let alice = mock.accounts().add(ALICE_EMAIL, ALICE_PASSWORD);
    tables.users.seed(profile_row(alice, ALICE_EMAIL, "student", "Alice"));
    let context = start_context(&mock, FeaturesConfig::default()).await;
    login(&context, ALICE_EMAIL, ALICE_PASSWORD).await;
    let store = context.store();

    assert!(store.get_settings(alice).await.is_none());

    let saved = store
        .save_settings(alice, preferences(json!({ "theme": "dark", "digest": true })))
        .await
        .unwrap();
    assert_eq!(saved.user_id, alice);

    store
        .save_settings(alice, preferences(json!({ "theme": "light" })))
        .await
        .unwrap();

    let loaded = store.get_settings(alice).await.expect("settings row");
    assert_eq!(loaded.preferences, preferences(json!({ "theme": "light" })));
    assert_eq!(tables.settings.len(), 1);
}

#[tokio::test]
async fn test_update_profile_leaves_unset_fields() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    let alice = mock.accounts().add(ALICE_EMAIL, ALICE_PASSWORD);
    tables.users.seed(profile_row(alice, ALICE_EMAIL, "student", "Alice"));
    let context = start_context(&mock, FeaturesConfig::default()).await;
    login(&context, ALICE_EMAIL, ALICE_PASSWORD).await;

    let request = UpdateProfileRequest {
        branch: Some("Computer Science".to_string()),
        year: Some("2".to_string()),
        ..Default::default()
    };
    let updated = context.store().update_profile(alice, request).await.unwrap();

    assert_eq!(updated.branch.as_deref(), Some("Computer Science"));
    assert_eq!(updated.name.as_deref(), Some("Alice"));
    assert_eq!(context.refresh().await.profile().and_then(|p| p.year.clone()).as_deref(), Some("2"));
}

#[tokio::test]
async fn test_update_unknown_profile_is_not_found() {
    let mock = ServiceMock::start().await;
    mount_tables(&mock).await;
    let store = mock.store();

    let request = UpdateProfileRequest { bio: Some("hello".to_string()), ..Default::default() };
    let err = store.update_profile(Uuid::new_v4(), request).await.unwrap_err();

    assert_matches!(err, CampusError::NotFound { entity: "users", .. });
}

#[tokio::test]
async fn test_reads_fall_back_to_empty_when_service_is_down() {
    let store = StoreService::connect(&StoreConfig {
        url: "http://127.0.0.1:9".to_string(),
        anon_key: ANON_KEY.to_string(),
        ..Default::default()
    })
    .unwrap();
    let user = Uuid::new_v4();

    assert!(store.fetch_events().await.is_empty());
    assert!(store.fetch_user_registrations(user).await.is_empty());
    assert!(store.fetch_notifications(user).await.is_empty());
    assert!(store.get_settings(user).await.is_none());
    assert!(store.create_registration(user, Uuid::new_v4()).await.is_err());
}

#[tokio::test]
async fn test_rows_that_do_not_decode_are_skipped() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    tables.events.seed(event_row("Hackathon", "2030-03-01", None));
    tables.events.seed(json!({ "id": Uuid::new_v4(), "name": "Broken", "date": "not-a-date" }));

    let events = mock.store().fetch_events().await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Hackathon");
}
