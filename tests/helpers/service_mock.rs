//! Mock hosted service for testing
//!
//! A wiremock server that answers the auth endpoints from an in-memory
//! account list and the row endpoints from in-memory tables. Tables honour
//! `eq.`, `in.()` and `gte.` filters, `order`, `limit`, unique constraints
//! and `on_conflict` upserts, which is all the client uses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;
use wiremock::{
    matchers::{method, path, path_regex, query_param},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

use campus_events::store::{StoreConfig, StoreService};

pub const ANON_KEY: &str = "anon-test-key";
pub const SERVICE_KEY: &str = "service-test-key";

/// Mock hosted service
pub struct ServiceMock {
    pub server: MockServer,
    accounts: Accounts,
    tables: Mutex<HashMap<&'static str, FakeTable>>,
}

impl ServiceMock {
    /// Start a server with the auth endpoints mounted
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let accounts = Accounts::default();

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(SignInResponder(accounts.clone()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(SignUpResponder(accounts.clone()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path_regex(r"^/auth/v1/admin/users/[0-9a-f-]+$"))
            .respond_with(DeleteUserResponder(accounts.clone()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        Self {
            server,
            accounts,
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            url: self.uri(),
            anon_key: ANON_KEY.to_string(),
            ..Default::default()
        }
    }

    pub fn store(&self) -> StoreService {
        StoreService::connect(&self.store_config()).expect("mock store config is valid")
    }

    /// A store that also carries the service key
    pub fn privileged_store(&self) -> StoreService {
        let config = StoreConfig {
            service_role_key: Some(SERVICE_KEY.to_string()),
            ..self.store_config()
        };
        StoreService::connect(&config).expect("mock store config is valid")
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Get or mount the fake table `name`
    pub async fn table(&self, name: &'static str, unique: &[&[&'static str]]) -> FakeTable {
        if let Some(table) = self.tables.lock().unwrap().get(name) {
            return table.clone();
        }

        let table = FakeTable::new(unique);
        let route = format!("/rest/v1/{}", name);

        Mock::given(method("GET"))
            .and(path(route.clone()))
            .respond_with(SelectResponder(table.clone()))
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path(route.clone()))
            .respond_with(InsertResponder(table.clone()))
            .mount(&self.server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(route))
            .respond_with(UpdateResponder(table.clone()))
            .mount(&self.server)
            .await;

        self.tables.lock().unwrap().insert(name, table.clone());
        table
    }

    /// Make every insert into `name` fail with the given status and body
    pub async fn fail_inserts(&self, name: &str, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/rest/v1/{}", name)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Make every read of `name` fail with the given status and body
    pub async fn fail_selects(&self, name: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", name)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Requests received so far with the given method and path
    pub async fn requests_to(&self, http_method: &str, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
            .count()
    }
}

/// Credentials known to the mock auth service
#[derive(Clone, Default)]
pub struct Accounts {
    inner: Arc<Mutex<AccountsInner>>,
}

#[derive(Default)]
struct AccountsInner {
    by_email: HashMap<String, (String, Uuid)>,
    deleted: Vec<Uuid>,
    confirm_email: bool,
}

impl Accounts {
    pub fn add(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.add_with_id(id, email, password);
        id
    }

    pub fn add_with_id(&self, id: Uuid, email: &str, password: &str) {
        self.inner
            .lock()
            .unwrap()
            .by_email
            .insert(email.to_string(), (password.to_string(), id));
    }

    pub fn id_of(&self, email: &str) -> Option<Uuid> {
        self.inner.lock().unwrap().by_email.get(email).map(|(_, id)| *id)
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.inner.lock().unwrap().deleted.clone()
    }

    /// Sign-ups return no session until the e-mail is confirmed
    pub fn require_confirmation(&self) {
        self.inner.lock().unwrap().confirm_email = true;
    }
}

fn token_response(id: Uuid, email: &str) -> Value {
    json!({
        "access_token": format!("token-{}", id),
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": format!("refresh-{}", id),
        "user": { "id": id, "email": email, "user_metadata": {} }
    })
}

struct SignInResponder(Accounts);

impl Respond for SignInResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().unwrap_or_default();
        let email = body["email"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();

        let accounts = self.0.inner.lock().unwrap();
        match accounts.by_email.get(email) {
            Some((expected, id)) if expected == password => {
                ResponseTemplate::new(200).set_body_json(token_response(*id, email))
            }
            _ => ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        }
    }
}

struct SignUpResponder(Accounts);

impl Respond for SignUpResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().unwrap_or_default();
        let email = body["email"].as_str().unwrap_or_default().to_string();
        let password = body["password"].as_str().unwrap_or_default().to_string();

        let mut accounts = self.0.inner.lock().unwrap();
        if accounts.by_email.contains_key(&email) {
            return ResponseTemplate::new(422).set_body_json(json!({
                "code": 422,
                "error_code": "user_already_exists",
                "msg": "User already registered"
            }));
        }

        let id = Uuid::new_v4();
        accounts.by_email.insert(email.clone(), (password, id));
        if accounts.confirm_email {
            ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "email": email,
                "user_metadata": body["data"].clone()
            }))
        } else {
            ResponseTemplate::new(200).set_body_json(token_response(id, &email))
        }
    }
}

struct DeleteUserResponder(Accounts);

impl Respond for DeleteUserResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = request
            .url
            .path_segments()
            .and_then(|segments| segments.last())
            .and_then(|last| last.parse::<Uuid>().ok());

        match id {
            Some(id) => {
                let mut accounts = self.0.inner.lock().unwrap();
                accounts.by_email.retain(|_, (_, account)| *account != id);
                accounts.deleted.push(id);
                ResponseTemplate::new(200).set_body_json(json!({}))
            }
            None => ResponseTemplate::new(404).set_body_json(json!({ "msg": "User not found" })),
        }
    }
}

/// In-memory table behind the row endpoints
#[derive(Clone)]
pub struct FakeTable {
    rows: Arc<Mutex<Vec<Value>>>,
    unique: Arc<Vec<Vec<&'static str>>>,
}

impl FakeTable {
    fn new(unique: &[&[&'static str]]) -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            unique: Arc::new(unique.iter().map(|cols| cols.to_vec()).collect()),
        }
    }

    pub fn seed(&self, row: Value) {
        self.rows.lock().unwrap().push(with_defaults(row));
    }

    pub fn rows(&self) -> Vec<Value> {
        self.rows.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn conflict(&self, rows: &[Value], candidate: &Value, columns: &[&str]) -> Option<usize> {
        rows.iter().position(|existing| {
            columns.iter().all(|col| existing.get(*col) == candidate.get(*col))
        })
    }
}

fn with_defaults(mut row: Value) -> Value {
    if let Some(fields) = row.as_object_mut() {
        fields.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
        fields.entry("created_at").or_insert_with(|| json!(Utc::now()));
    }
    row
}

fn column_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches_filters(row: &Value, request: &Request) -> bool {
    request.url.query_pairs().all(|(key, filter)| {
        if matches!(key.as_ref(), "select" | "order" | "limit" | "on_conflict") {
            return true;
        }
        let actual = column_text(row.get(key.as_ref()));

        if let Some(expected) = filter.strip_prefix("eq.") {
            actual.as_deref() == Some(expected)
        } else if let Some(bound) = filter.strip_prefix("gte.") {
            actual.map(|a| a.as_str() >= bound).unwrap_or(false)
        } else if let Some(list) = filter.strip_prefix("in.(").and_then(|l| l.strip_suffix(')')) {
            actual.map(|a| list.split(',').any(|item| item == a)).unwrap_or(false)
        } else {
            true
        }
    })
}

fn query_value(request: &Request, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn unique_violation(columns: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(409).set_body_json(json!({
        "code": "23505",
        "message": format!("duplicate key value violates unique constraint on ({})", columns.join(", ")),
        "details": null
    }))
}

struct SelectResponder(FakeTable);

impl Respond for SelectResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut rows: Vec<Value> = self
            .0
            .rows()
            .into_iter()
            .filter(|row| matches_filters(row, request))
            .collect();

        if let Some(order) = query_value(request, "order") {
            let first = order.split(',').next().unwrap_or_default();
            let (column, direction) = first.split_once('.').unwrap_or((first, "asc"));
            rows.sort_by(|a, b| column_text(a.get(column)).cmp(&column_text(b.get(column))));
            if direction == "desc" {
                rows.reverse();
            }
        }
        if let Some(limit) = query_value(request, "limit").and_then(|l| l.parse::<usize>().ok()) {
            rows.truncate(limit);
        }

        ResponseTemplate::new(200).set_body_json(Value::Array(rows))
    }
}

struct InsertResponder(FakeTable);

impl Respond for InsertResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match request.body_json() {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400).set_body_json(json!({ "message": "invalid body" })),
        };
        let candidates = match body {
            Value::Array(items) => items,
            other => vec![other],
        };
        let on_conflict = query_value(request, "on_conflict");

        let mut rows = self.0.rows.lock().unwrap();
        let mut stored = Vec::new();
        for candidate in candidates {
            if let Some(columns) = &on_conflict {
                let columns: Vec<&str> = columns.split(',').collect();
                if let Some(index) = self.0.conflict(&rows, &candidate, &columns) {
                    merge(&mut rows[index], &candidate);
                    stored.push(rows[index].clone());
                    continue;
                }
            }

            for columns in self.0.unique.iter() {
                if self.0.conflict(&rows, &candidate, columns).is_some() {
                    return unique_violation(columns);
                }
            }

            let row = with_defaults(candidate);
            rows.push(row.clone());
            stored.push(row);
        }

        ResponseTemplate::new(201).set_body_json(Value::Array(stored))
    }
}

struct UpdateResponder(FakeTable);

impl Respond for UpdateResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let patch: Value = request.body_json().unwrap_or_else(|_| Value::Object(Map::new()));
        let mut rows = self.0.rows.lock().unwrap();
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| matches_filters(row, request)) {
            merge(row, &patch);
            updated.push(row.clone());
        }
        ResponseTemplate::new(200).set_body_json(Value::Array(updated))
    }
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}
