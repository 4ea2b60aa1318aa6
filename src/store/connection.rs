//! Remote service connection management
//!
//! Every request to the hosted service goes through [`RemoteClient`], which
//! carries the endpoint, the public API key, the caller's session token and
//! the per-request timeout.

use std::time::{Duration, Instant};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use crate::config::ServiceConfig;
use crate::store::auth::SessionStore;
use crate::store::query::error_from_response;
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::mask_secret;
use crate::utils::logging::log_request;

/// Connection settings for the hosted service
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            service_role_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ServiceConfig> for StoreConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// Which key authorizes a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// The signed-in user's access token, falling back to the public key
    Session,
    /// Always the public key
    Anonymous,
    /// The privileged service key
    Service,
}

#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    service_role_key: Option<String>,
    timeout: Duration,
    sessions: SessionStore,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RemoteClient {
    /// Create a client; an empty endpoint or key is a configuration error
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(CampusError::Config("Service URL is not configured".to_string()));
        }
        if config.anon_key.trim().is_empty() {
            return Err(CampusError::Config("Service API key is not configured".to_string()));
        }

        let mut base_url = Url::parse(config.url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("campus-events/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(
            url = %base_url,
            anon_key = %mask_secret(&config.anon_key),
            service_key = config.service_role_key.is_some(),
            "Remote client configured"
        );
        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            timeout: config.request_timeout,
            sessions: SessionStore::new(),
        })
    }

    /// Session holder shared with the auth client
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn has_service_key(&self) -> bool {
        self.service_role_key.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an authorized request for a path relative to the service root
    pub async fn request(&self, method: Method, path: &str, credential: Credential) -> Result<RequestBuilder> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;

        let bearer = match credential {
            Credential::Session => self
                .sessions
                .access_token()
                .await
                .unwrap_or_else(|| self.anon_key.clone()),
            Credential::Anonymous => self.anon_key.clone(),
            Credential::Service => self.service_role_key.clone().ok_or_else(|| {
                CampusError::Config("Service role key is not configured".to_string())
            })?,
        };

        let api_key = match credential {
            Credential::Service => bearer.clone(),
            _ => self.anon_key.clone(),
        };

        Ok(self
            .http
            .request(method, url)
            .header("apikey", api_key)
            .bearer_auth(bearer))
    }

    /// Send a request and map non-success responses to [`CampusError`]
    pub async fn execute(&self, builder: RequestBuilder, resource: &str) -> Result<Response> {
        let request = builder.build()?;
        let method = request.method().clone();
        let started = Instant::now();

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                log_request(method.as_str(), resource, started.elapsed().as_millis() as u64, None);
                return Err(self.map_transport_error(e));
            }
        };
        let status = response.status();
        log_request(method.as_str(), resource, started.elapsed().as_millis() as u64, Some(status.as_u16()));

        if status.is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Send a request and decode a JSON body
    pub async fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder, resource: &str) -> Result<T> {
        let response = self.execute(builder, resource).await?;
        let bytes = response.bytes().await.map_err(|e| self.map_transport_error(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> CampusError {
        if error.is_timeout() {
            CampusError::Timeout { seconds: self.timeout.as_secs() }
        } else {
            CampusError::Network(error)
        }
    }
}

/// Check that the service answers on its REST root
pub async fn health_check(client: &RemoteClient) -> Result<()> {
    let builder = client.request(Method::GET, "rest/v1/", Credential::Anonymous).await?;
    client.execute(builder, "rest/v1").await?;
    Ok(())
}
