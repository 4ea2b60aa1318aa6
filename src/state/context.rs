//! Session resolution
//!
//! [`AuthContext`] turns the raw session held by the store into an
//! [`AuthState`]. Two paths feed it: the initial session check and the
//! session-change listener. Both run the same resolution, so whichever
//! finishes last leaves the same answer; a resolution overtaken by a newer
//! session event is dropped instead of being published.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use crate::config::FeaturesConfig;
use crate::models::{CreateProfileRequest, Profile, Role};
use crate::store::{Session, SignUpMetadata, StoreService};
use crate::utils::errors::{CampusError, Result};
use crate::utils::logging::{log_api_error, log_user_action};
use super::session::AuthState;

/// Minimum password length accepted by the auth service
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Result of a completed sign-up
#[derive(Debug, Clone)]
pub struct SignUpReceipt {
    pub profile: Profile,
    /// False when the service requires e-mail confirmation before signing in
    pub session_started: bool,
}

/// Shared resolution logic used by the listener, the initial check and refreshes
#[derive(Clone)]
struct Resolver {
    store: StoreService,
    state: Arc<watch::Sender<AuthState>>,
    epoch: Arc<AtomicU64>,
}

impl Resolver {
    /// Start a new resolution generation; older ones become stale
    fn bump(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    async fn resolve(&self, epoch: u64, session: Option<Session>) {
        let next = match session {
            None => AuthState::SignedOut,
            Some(session) => self.resolve_profile(&session).await,
        };
        self.publish(epoch, next);
    }

    async fn resolve_profile(&self, session: &Session) -> AuthState {
        let user_id = session.user.id;
        match self.store.users.find_by_id(user_id).await {
            Ok(Some(profile)) => AuthState::SignedIn(profile),
            Ok(None) => {
                warn!(user_id = %user_id, "Session has no profile row");
                AuthState::ProfileMissing { user_id, email: session.user.email.clone() }
            }
            Err(e) => {
                log_api_error("users.find_by_id", &e, Some(&user_id.to_string()));
                AuthState::ProfileMissing { user_id, email: session.user.email.clone() }
            }
        }
    }

    fn publish(&self, epoch: u64, next: AuthState) -> bool {
        if self.current_epoch() != epoch {
            debug!(epoch = epoch, "Discarding stale session resolution");
            return false;
        }

        info!(
            user_id = ?next.user_id(),
            role = ?next.role(),
            signed_in = next.has_session(),
            "Auth state resolved"
        );
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        true
    }
}

/// Application-wide identity holder
pub struct AuthContext {
    store: StoreService,
    resolver: Resolver,
    features: FeaturesConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AuthContext {
    /// Subscribe to session changes and run the initial session check.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: StoreService, features: FeaturesConfig) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        let resolver = Resolver {
            store: store.clone(),
            state: Arc::new(state),
            epoch: Arc::new(AtomicU64::new(0)),
        };

        // Subscribe before the initial check so no event slips between them
        let mut events = store.auth.subscribe();
        let listener = {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            let epoch = resolver.bump();
                            resolver.resolve(epoch, event.session().cloned()).await;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped = skipped, "Session listener lagged; resolving current session");
                            let epoch = resolver.bump();
                            let session = resolver.store.client.sessions().current().await;
                            resolver.resolve(epoch, session).await;
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                debug!("Session listener stopped");
            })
        };

        let initial = {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let epoch = resolver.current_epoch();
                let session = resolver.store.auth.get_session().await;
                resolver.resolve(epoch, session).await;
            })
        };

        Self {
            store,
            resolver,
            features,
            tasks: Mutex::new(vec![listener, initial]),
        }
    }

    pub fn store(&self) -> &StoreService {
        &self.store
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.resolver.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.resolver.state.subscribe()
    }

    /// Current state followed by every change
    pub fn changes(&self) -> impl Stream<Item = AuthState> {
        let mut rx = self.subscribe();
        async_stream::stream! {
            let current = rx.borrow_and_update().clone();
            yield current;
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                yield next;
            }
        }
    }

    /// Wait until the state satisfies `predicate`
    pub async fn wait_until<F>(&self, mut predicate: F) -> AuthState
    where
        F: FnMut(&AuthState) -> bool,
    {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|state| predicate(state)).await.map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// Wait for the initial session check to settle
    pub async fn wait_resolved(&self) -> AuthState {
        self.wait_until(|state| !state.is_loading()).await
    }

    /// Sign in with e-mail and password.
    ///
    /// The state is updated by the session listener, not here; await
    /// [`AuthContext::wait_until`] for the resulting profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(CampusError::InvalidInput("Password is required".to_string()));
        }

        let session = self.store.auth.sign_in_with_password(email, password).await?;
        log_user_action(session.user.id, "login", None);
        Ok(())
    }

    /// Create a credential and its profile row.
    ///
    /// When the profile insert fails after the credential exists, the
    /// credential is deleted again if a service key is configured and
    /// compensation is enabled; either way the caller gets
    /// [`CampusError::IncompleteSignUp`].
    pub async fn register(&self, email: &str, password: &str, role: Role, name: &str) -> Result<SignUpReceipt> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CampusError::InvalidInput("Name is required".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CampusError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let metadata = SignUpMetadata { role, name: name.to_string() };
        let signup = self.store.auth.sign_up(email, password, &metadata).await?;
        let user_id = signup.user.id;

        let request = CreateProfileRequest {
            id: user_id,
            email: signup.user.email.clone().unwrap_or_else(|| email.trim().to_string()),
            role,
            name: Some(name.to_string()),
        };

        match self.store.users.create(request).await {
            Ok(profile) => {
                log_user_action(user_id, "sign_up", Some(role.as_str()));
                if signup.session.is_some() {
                    self.refresh().await;
                }
                Ok(SignUpReceipt { profile, session_started: signup.session.is_some() })
            }
            Err(e) => {
                log_api_error("users.create", &e, Some(&user_id.to_string()));
                let compensated = self.compensate_sign_up(user_id).await;
                if signup.session.is_some() {
                    self.logout().await;
                }
                Err(CampusError::IncompleteSignUp { user_id, compensated, reason: e.user_message() })
            }
        }
    }

    async fn compensate_sign_up(&self, user_id: Uuid) -> bool {
        if !self.features.signup_compensation || !self.store.client.has_service_key() {
            error!(user_id = %user_id, "Credential left without a profile; no compensation available");
            return false;
        }

        match self.store.auth.delete_user(user_id).await {
            Ok(()) => true,
            Err(e) => {
                log_api_error("auth.delete_user", &e, Some(&user_id.to_string()));
                error!(user_id = %user_id, "Credential left without a profile; compensation failed");
                false
            }
        }
    }

    /// Sign out; the local state is cleared even if the remote call fails
    pub async fn logout(&self) {
        let user_id = self.state().user_id();
        if let Err(e) = self.store.auth.sign_out().await {
            warn!(error = %e, "Remote sign-out failed");
        }

        let epoch = self.resolver.bump();
        self.resolver.publish(epoch, AuthState::SignedOut);
        if let Some(user_id) = user_id {
            log_user_action(user_id, "logout", None);
        }
    }

    /// Re-read the profile of the current session
    pub async fn refresh(&self) -> AuthState {
        let epoch = self.resolver.bump();
        let session = self.store.auth.get_session().await;
        self.resolver.resolve(epoch, session).await;
        self.state()
    }

    /// Stop the background tasks
    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("state", &self.state())
            .field("features", &self.features)
            .finish()
    }
}
