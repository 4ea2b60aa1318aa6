//! Row queries against the hosted REST interface
//!
//! [`RowQuery`] builds the filter/order/limit parameters understood by the
//! row API, and the row operations on [`RemoteClient`] turn them into
//! requests. Error bodies from both the row API and the auth API are mapped
//! into [`CampusError`] here.

use std::fmt::Display;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use crate::store::connection::{Credential, RemoteClient};
use crate::utils::errors::{CampusError, Result};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const INSUFFICIENT_PRIVILEGE: &str = "42501";
const JWT_EXPIRED: &str = "PGRST301";

/// Filtered select against one table
#[derive(Debug, Clone)]
pub struct RowQuery {
    table: &'static str,
    columns: String,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl RowQuery {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("gte.{}", value)));
        self
    }

    pub fn in_list<T: Display>(mut self, column: &str, values: &[T]) -> Self {
        let joined = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
        self.filters.push((column.to_string(), format!("in.({})", joined)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn path(&self) -> String {
        format!("rest/v1/{}", self.table)
    }

    /// Query string pairs, `select` first
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Filters only, as used by updates
    fn filter_params(&self) -> Vec<(String, String)> {
        self.filters.clone()
    }
}

/// Error body returned by either the row API or the auth API
#[derive(Debug, Default, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl RemoteErrorBody {
    fn code(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(code)) => Some(code.clone()),
            _ => self.error_code.clone(),
        }
    }

    fn message(&self, status: u16) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("HTTP {}", status))
    }
}

/// Map an HTTP status and error body onto the error taxonomy
pub fn classify_error(status: u16, body: &RemoteErrorBody) -> CampusError {
    let message = body.message(status);

    match body.code().as_deref() {
        Some(UNIQUE_VIOLATION) => return CampusError::UniqueViolation(message),
        Some(FOREIGN_KEY_VIOLATION) => return CampusError::ForeignKeyViolation(message),
        Some(INSUFFICIENT_PRIVILEGE) => return CampusError::PolicyRejected(message),
        Some(JWT_EXPIRED) | Some("session_expired") | Some("bad_jwt") => return CampusError::SessionExpired,
        Some("invalid_credentials") => return CampusError::InvalidCredentials,
        _ => {}
    }

    if body.error.as_deref() == Some("invalid_grant") {
        return CampusError::InvalidCredentials;
    }

    match status {
        401 if message.to_ascii_lowercase().contains("jwt expired") => CampusError::SessionExpired,
        401 | 403 => CampusError::PolicyRejected(message),
        409 => CampusError::UniqueViolation(message),
        _ => CampusError::Remote { status, message },
    }
}

pub(crate) async fn error_from_response(response: Response) -> CampusError {
    let status = response.status().as_u16();
    let body = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice::<RemoteErrorBody>(&bytes).unwrap_or_else(|_| RemoteErrorBody {
            message: Some(String::from_utf8_lossy(&bytes).trim().to_string()).filter(|m| !m.is_empty()),
            ..Default::default()
        }),
        Err(_) => RemoteErrorBody::default(),
    };
    classify_error(status, &body)
}

impl RemoteClient {
    /// Select rows; rows that do not decode are logged and skipped
    pub async fn select<T: DeserializeOwned>(&self, query: &RowQuery) -> Result<Vec<T>> {
        let builder = self
            .request(Method::GET, &query.path(), Credential::Session)
            .await?
            .query(&query.params());
        let raw: Vec<serde_json::Value> = self.execute_json(builder, query.table_name()).await?;

        let mut rows = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<T>(value) {
                Ok(row) => rows.push(row),
                Err(e) => warn!(table = query.table_name(), error = %e, "Skipping row that does not decode"),
            }
        }
        Ok(rows)
    }

    /// Select at most one row
    pub async fn select_one<T: DeserializeOwned>(&self, query: RowQuery) -> Result<Option<T>> {
        let query = query.limit(1);
        let builder = self
            .request(Method::GET, &query.path(), Credential::Session)
            .await?
            .query(&query.params());
        let mut rows: Vec<T> = self.execute_json(builder, query.table_name()).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    /// Insert one row and return it as stored
    pub async fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &'static str, body: &B) -> Result<T> {
        let builder = self
            .request(Method::POST, &format!("rest/v1/{}", table), Credential::Session)
            .await?
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = self.execute_json(builder, table).await?;
        first_row(rows, || CampusError::PolicyRejected(format!("insert into {} returned no row", table)))
    }

    /// Update every row matching the query's filters and return them as
    /// stored; an empty result means nothing matched
    pub async fn update_where<B: Serialize, T: DeserializeOwned>(&self, query: &RowQuery, body: &B) -> Result<Vec<T>> {
        let builder = self
            .request(Method::PATCH, &query.path(), Credential::Session)
            .await?
            .query(&query.filter_params())
            .header("Prefer", "return=representation")
            .json(body);
        self.execute_json(builder, query.table_name()).await
    }

    /// Update the row with the given id
    pub async fn update_by_id<B: Serialize, T: DeserializeOwned>(&self, table: &'static str, id: Uuid, body: &B) -> Result<T> {
        let rows = self.update_where(&RowQuery::table(table).eq("id", id), body).await?;
        first_row(rows, || CampusError::NotFound { entity: table, id: id.to_string() })
    }

    /// Insert or merge on the given conflict columns
    pub async fn upsert<B: Serialize, T: DeserializeOwned>(&self, table: &'static str, body: &B, on_conflict: &str) -> Result<T> {
        let builder = self
            .request(Method::POST, &format!("rest/v1/{}", table), Credential::Session)
            .await?
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(body);
        let rows: Vec<T> = self.execute_json(builder, table).await?;
        first_row(rows, || CampusError::PolicyRejected(format!("upsert into {} returned no row", table)))
    }
}

fn first_row<T>(mut rows: Vec<T>, empty: impl FnOnce() -> CampusError) -> Result<T> {
    if rows.is_empty() {
        Err(empty())
    } else {
        Ok(rows.swap_remove(0))
    }
}
