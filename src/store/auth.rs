//! Credential operations against the hosted auth API
//!
//! [`AuthClient`] signs users in and out and owns nothing itself: the current
//! session lives in the [`SessionStore`] shared with [`RemoteClient`], which
//! also broadcasts every change so that listeners can re-resolve identity.

use std::sync::Arc;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::models::Role;
use crate::store::connection::{Credential, RemoteClient};
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::is_valid_email;
use crate::utils::logging::log_session_change;

/// Capacity of the session-change channel; slow listeners skip ahead
const SESSION_EVENT_CAPACITY: usize = 16;

/// Identity as known to the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Claims read from the access token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub exp: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    /// Read the token's claims without verifying its signature; only the
    /// service can verify, the client just needs `exp` and `sub`.
    pub fn claims(&self) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(&self.access_token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| CampusError::InvalidInput(format!("Unreadable access token: {}", e)))
    }

    /// Expiry from the token response, or from the token itself
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at.or_else(|| {
            self.claims()
                .ok()
                .and_then(|claims| claims.exp)
                .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
        })
    }

    /// A session without a known expiry is treated as valid
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry().map(|expiry| expiry <= now).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for Session {
    fn from(response: TokenResponse) -> Self {
        let expires_at = response
            .expires_at
            .and_then(|at| Utc.timestamp_opt(at, 0).single())
            .or_else(|| response.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));

        Session {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            user: response.user,
        }
    }
}

/// Sign-up answers with a session when e-mail confirmation is off and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    WithSession(TokenResponse),
    UserOnly(AuthUser),
}

/// Metadata stored with the credential at sign-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpMetadata {
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SignUpResult {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// Session change notification
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl SessionEvent {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session) => Some(session),
            SessionEvent::SignedOut => None,
        }
    }
}

/// Holder of the current session and publisher of its changes
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            current: Arc::new(RwLock::new(None)),
            events,
        }
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.access_token.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Replace the session and notify listeners
    pub async fn set(&self, event: SessionEvent) {
        {
            let mut current = self.current.write().await;
            *current = event.session().cloned();
        }
        log_session_change(
            match &event {
                SessionEvent::SignedIn(_) => "signed_in",
                SessionEvent::TokenRefreshed(_) => "token_refreshed",
                SessionEvent::SignedOut => "signed_out",
            },
            event.session().map(|s| s.user.id),
        );
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Credential operations
#[derive(Clone, Debug)]
pub struct AuthClient {
    client: RemoteClient,
}

impl AuthClient {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.client.sessions().subscribe()
    }

    /// Exchange e-mail and password for a session
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(CampusError::InvalidInput(format!("Invalid e-mail address: {}", email)));
        }

        debug!(email = email, "Signing in with password");
        let builder = self
            .client
            .request(Method::POST, "auth/v1/token", Credential::Anonymous)
            .await?
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));

        let response: TokenResponse = self.client.execute_json(builder, "auth/token").await?;
        let session = Session::from(response);
        info!(user_id = %session.user.id, "Signed in");

        self.client.sessions().set(SessionEvent::SignedIn(session.clone())).await;
        Ok(session)
    }

    /// Create a credential with profile metadata attached
    pub async fn sign_up(&self, email: &str, password: &str, metadata: &SignUpMetadata) -> Result<SignUpResult> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(CampusError::InvalidInput(format!("Invalid e-mail address: {}", email)));
        }

        debug!(email = email, role = %metadata.role, "Creating credential");
        let builder = self
            .client
            .request(Method::POST, "auth/v1/signup", Credential::Anonymous)
            .await?
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            }));

        let response: SignUpResponse = self.client.execute_json(builder, "auth/signup").await?;
        let result = match response {
            SignUpResponse::WithSession(token) => {
                let session = Session::from(token);
                SignUpResult { user: session.user.clone(), session: Some(session) }
            }
            SignUpResponse::UserOnly(user) => SignUpResult { user, session: None },
        };

        info!(user_id = %result.user.id, confirmed = result.session.is_some(), "Credential created");
        if let Some(session) = &result.session {
            self.client.sessions().set(SessionEvent::SignedIn(session.clone())).await;
        }
        Ok(result)
    }

    /// Invalidate the remote session; the local session is cleared even when
    /// the remote call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let had_session = self.client.sessions().current().await.is_some();

        let remote = if had_session {
            match self.client.request(Method::POST, "auth/v1/logout", Credential::Session).await {
                Ok(builder) => self.client.execute(builder, "auth/logout").await.map(|_| ()),
                Err(e) => Err(e),
            }
        } else {
            Ok(())
        };

        self.client.sessions().set(SessionEvent::SignedOut).await;
        remote
    }

    /// Current session, refreshed when its access token has expired
    pub async fn get_session(&self) -> Option<Session> {
        let session = self.client.sessions().current().await?;
        if !session.is_expired() {
            return Some(session);
        }

        match self.refresh_session(&session).await {
            Ok(refreshed) => Some(refreshed),
            Err(e) => {
                warn!(user_id = %session.user.id, error = %e, "Session expired and could not be refreshed");
                self.client.sessions().set(SessionEvent::SignedOut).await;
                None
            }
        }
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session> {
        let refresh_token = session.refresh_token.as_deref().ok_or(CampusError::SessionExpired)?;

        let builder = self
            .client
            .request(Method::POST, "auth/v1/token", Credential::Anonymous)
            .await?
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }));

        let response: TokenResponse = self.client.execute_json(builder, "auth/token").await?;
        let refreshed = Session::from(response);
        self.client.sessions().set(SessionEvent::TokenRefreshed(refreshed.clone())).await;
        Ok(refreshed)
    }

    /// Remove a credential; needs the service key
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let path = format!("auth/v1/admin/users/{}", urlencoding::encode(&user_id.to_string()));
        let builder = self.client.request(Method::DELETE, &path, Credential::Service).await?;
        self.client.execute(builder, "auth/admin/users").await?;
        warn!(user_id = %user_id, "Credential deleted");
        Ok(())
    }
}
