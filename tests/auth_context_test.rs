//! Session resolution against the mock service

mod helpers;

use assert_matches::assert_matches;
use futures::StreamExt;
use helpers::*;
use uuid::Uuid;

use campus_events::config::FeaturesConfig;
use campus_events::dashboard::{gate, route_dashboard, DashboardView, Route, RouteDecision};
use campus_events::models::Role;
use campus_events::state::AuthState;
use campus_events::CampusError;

#[tokio::test]
async fn test_login_resolves_profile() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    let alice = mock.accounts().add(ALICE_EMAIL, ALICE_PASSWORD);
    tables.users.seed(profile_row(alice, ALICE_EMAIL, "student", "Alice"));

    let context = start_context(&mock, FeaturesConfig::default()).await;
    assert_eq!(context.state(), AuthState::SignedOut);

    let state = login(&context, ALICE_EMAIL, ALICE_PASSWORD).await;
    let profile = state.profile().expect("profile resolved");
    assert_eq!(profile.id, alice);
    assert_eq!(state.role(), Some(Role::Student));
    assert_eq!(route_dashboard(&state), DashboardView::Student);
    assert_eq!(gate(Route::Auth, &state), RouteDecision::Redirect(Route::Dashboard));
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let mock = ServiceMock::start().await;
    mount_tables(&mock).await;
    mock.accounts().add(ALICE_EMAIL, ALICE_PASSWORD);

    let context = start_context(&mock, FeaturesConfig::default()).await;
    let err = context.login(ALICE_EMAIL, "wrong-password").await.unwrap_err();

    assert_matches!(err, CampusError::InvalidCredentials);
    assert_eq!(context.state(), AuthState::SignedOut);
}

#[tokio::test]
async fn test_missing_profile_is_reported_not_fatal() {
    let mock = ServiceMock::start().await;
    mount_tables(&mock).await;
    let orphan = mock.accounts().add("orphan@campus.edu", "orphan-secret");

    let context = start_context(&mock, FeaturesConfig::default()).await;
    let state = login(&context, "orphan@campus.edu", "orphan-secret").await;

    assert_eq!(
        state,
        AuthState::ProfileMissing { user_id: orphan, email: Some("orphan@campus.edu".to_string()) }
    );
    assert_eq!(route_dashboard(&state), DashboardView::ProfileMissing);
    assert_eq!(gate(Route::Dashboard, &state), RouteDecision::Render(Route::Dashboard));
}

#[tokio::test]
async fn test_unknown_stored_role_falls_back() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    let id = mock.accounts().add("dean@campus.edu", "dean-secret");
    tables.users.seed(profile_row(id, "dean@campus.edu", "dean", "Dean"));

    let context = start_context(&mock, FeaturesConfig::default()).await;
    let state = login(&context, "dean@campus.edu", "dean-secret").await;

    assert_eq!(route_dashboard(&state), DashboardView::UnknownRole("dean".to_string()));
}

#[tokio::test]
async fn test_logout_clears_user_and_redirects() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    let alice = mock.accounts().add(ALICE_EMAIL, ALICE_PASSWORD);
    tables.users.seed(profile_row(alice, ALICE_EMAIL, "student", "Alice"));

    let context = start_context(&mock, FeaturesConfig::default()).await;
    login(&context, ALICE_EMAIL, ALICE_PASSWORD).await;

    context.logout().await;

    let state = context.state();
    assert_eq!(state, AuthState::SignedOut);
    assert!(context.store().client.sessions().current().await.is_none());
    assert_eq!(gate(Route::Dashboard, &state), RouteDecision::Redirect(Route::Auth));
    assert_eq!(mock.requests_to("POST", "/auth/v1/logout").await, 1);
}

#[tokio::test]
async fn test_changes_stream_follows_session() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    let alice = mock.accounts().add(ALICE_EMAIL, ALICE_PASSWORD);
    tables.users.seed(profile_row(alice, ALICE_EMAIL, "student", "Alice"));

    let context = start_context(&mock, FeaturesConfig::default()).await;
    let changes = context.changes();
    futures::pin_mut!(changes);

    assert_eq!(changes.next().await, Some(AuthState::SignedOut));

    context.login(ALICE_EMAIL, ALICE_PASSWORD).await.unwrap();
    let next = tokio::time::timeout(WAIT, changes.next()).await.unwrap().unwrap();
    assert_eq!(next.user_id(), Some(alice));

    context.logout().await;
    let next = tokio::time::timeout(WAIT, changes.next()).await.unwrap().unwrap();
    assert_eq!(next, AuthState::SignedOut);
}

#[tokio::test]
async fn test_refresh_picks_up_late_profile() {
    let mock = ServiceMock::start().await;
    let tables = mount_tables(&mock).await;
    let id: Uuid = mock.accounts().add("late@campus.edu", "late-secret");

    let context = start_context(&mock, FeaturesConfig::default()).await;
    let state = login(&context, "late@campus.edu", "late-secret").await;
    assert_matches!(state, AuthState::ProfileMissing { .. });

    tables.users.seed(profile_row(id, "late@campus.edu", "teacher", "Late Teacher"));
    let state = context.refresh().await;
    assert_eq!(state.role(), Some(Role::Teacher));
}
