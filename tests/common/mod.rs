use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use cinedex::clients::{
    AuthError, AuthProvider, AuthUser, BunnyError, ObjectStorage, PostgrestError, Query,
    RestClient, StorageError, VideoHost,
};
use cinedex::config::Config;
use cinedex::domain::UserId;
use cinedex::state::{Backends, SharedState};
use serde_json::{Value, json};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const VIEWER_TOKEN: &str = "viewer-token";
pub const ADMIN_ID: &str = "admin-1";
pub const VIEWER_ID: &str = "viewer-1";

/// In-memory tables. Every call is appended to a shared log as `op:table`.
#[derive(Default)]
pub struct FakeRest {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    failing_inserts: Mutex<HashSet<String>>,
    empty_inserts: Mutex<HashSet<String>>,
    patches: Mutex<Vec<(String, Value)>>,
    next_id: Mutex<u64>,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeRest {
    pub fn with_log(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn fail_inserts_into(&self, table: &str) {
        self.failing_inserts
            .lock()
            .unwrap()
            .insert(table.to_string());
    }

    /// Inserts into `table` succeed but return no representation.
    pub fn return_nothing_from(&self, table: &str) {
        self.empty_inserts
            .lock()
            .unwrap()
            .insert(table.to_string());
    }

    /// Patch bodies sent to `table`, in call order.
    pub fn patches(&self, table: &str) -> Vec<Value> {
        self.patches
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, patch)| patch.clone())
            .collect()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn matching(&self, query: &Query) -> Vec<Value> {
        self.rows(query.table())
            .into_iter()
            .filter(|row| matches_eq_filters(query, row))
            .collect()
    }

    fn replace_table(&self, table: &str, rows: Vec<Value>) {
        self.tables.lock().unwrap().insert(table.to_string(), rows);
    }

    fn assign_id(&self, table: &str, mut row: Value) -> Value {
        if row.get("id").is_none() {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = if table == "media_items" {
                json!(format!("media-{}", *next))
            } else {
                json!(*next)
            };
            row["id"] = id;
        }
        row
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Applies every `column=eq.value` filter of `query`. Other operators pass.
fn matches_eq_filters(query: &Query, row: &Value) -> bool {
    query.params().iter().all(|(column, value)| {
        match value.strip_prefix("eq.") {
            Some(wanted) => column_text(row, column).as_deref() == Some(wanted),
            None => true,
        }
    })
}

fn same_key(a: &Value, b: &Value, columns: &[&str]) -> bool {
    columns
        .iter()
        .all(|c| column_text(a, c).is_some() && column_text(a, c) == column_text(b, c))
}

fn backend_failure(table: &str) -> PostgrestError {
    PostgrestError::Status {
        table: table.to_string(),
        status: 500,
        code: None,
        message: "simulated failure".to_string(),
    }
}

#[async_trait]
impl RestClient for FakeRest {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, PostgrestError> {
        self.record(format!("select:{}", query.table()));
        Ok(self.matching(query))
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>, PostgrestError> {
        self.record(format!("insert:{table}"));
        if self.failing_inserts.lock().unwrap().contains(table) {
            return Err(backend_failure(table));
        }

        let rows = match rows {
            Value::Array(rows) => rows,
            row => vec![row],
        };
        let stored: Vec<Value> = rows
            .into_iter()
            .map(|row| self.assign_id(table, row))
            .collect();
        self.seed(table, stored.clone());
        if self.empty_inserts.lock().unwrap().contains(table) {
            return Ok(Vec::new());
        }
        Ok(stored)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Value,
        on_conflict: &str,
    ) -> Result<Vec<Value>, PostgrestError> {
        self.record(format!("upsert:{table}"));
        let rows = match rows {
            Value::Array(rows) => rows,
            row => vec![row],
        };
        let key: Vec<&str> = on_conflict.split(',').map(str::trim).collect();

        let mut stored = self.rows(table);
        stored.retain(|existing| !rows.iter().any(|row| same_key(existing, row, &key)));
        stored.extend(rows.iter().cloned());
        self.replace_table(table, stored);
        Ok(rows)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, PostgrestError> {
        self.record(format!("update:{}", query.table()));
        self.patches
            .lock()
            .unwrap()
            .push((query.table().to_string(), patch.clone()));

        let mut updated = Vec::new();
        let mut rows = self.rows(query.table());
        for row in rows.iter_mut().filter(|row| matches_eq_filters(query, row)) {
            if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
                for (k, v) in changes {
                    target.insert(k.clone(), v.clone());
                }
            }
            updated.push(row.clone());
        }
        self.replace_table(query.table(), rows);
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<(), PostgrestError> {
        self.record(format!("delete:{}", query.table()));
        let mut rows = self.rows(query.table());
        rows.retain(|row| !matches_eq_filters(query, row));
        self.replace_table(query.table(), rows);
        Ok(())
    }
}

pub struct FakeStorage {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(
        &self,
        path: &str,
        _bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.log.lock().unwrap().push(format!("upload:{path}"));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/media/{path}")
    }
}

pub struct FakeVideoHost {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl VideoHost for FakeVideoHost {
    async fn upload_video(&self, title: &str, _bytes: Bytes) -> Result<String, BunnyError> {
        self.log.lock().unwrap().push(format!("video:{title}"));
        Ok("https://iframe.test/embed/lib/guid-1".to_string())
    }
}

pub struct FakeAuth;

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let id = match access_token {
            ADMIN_TOKEN => ADMIN_ID,
            VIEWER_TOKEN => VIEWER_ID,
            _ => return Err(AuthError::InvalidToken),
        };
        Ok(AuthUser {
            id: UserId::new(id),
            email: Some(format!("{id}@example.com")),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub rest: Arc<FakeRest>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl TestApp {
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

/// Builds the full router on top of fakes. `setup` runs before any request
/// so tables can be seeded.
pub async fn spawn_app(setup: impl FnOnce(&FakeRest)) -> TestApp {
    spawn_app_with(false, setup).await
}

pub async fn spawn_app_with(with_video_host: bool, setup: impl FnOnce(&FakeRest)) -> TestApp {
    let log = Arc::new(Mutex::new(Vec::new()));
    let rest = Arc::new(FakeRest::with_log(Arc::clone(&log)));

    rest.seed(
        "profiles",
        vec![
            json!({ "id": ADMIN_ID, "username": "root", "avatar_url": null, "is_admin": true }),
            json!({ "id": VIEWER_ID, "username": "viewer", "avatar_url": null, "is_admin": false }),
        ],
    );
    setup(&rest);

    let video_host = with_video_host.then(|| {
        Arc::new(FakeVideoHost {
            log: Arc::clone(&log),
        }) as Arc<dyn VideoHost>
    });

    let backends = Backends {
        rest: Arc::clone(&rest) as Arc<dyn RestClient>,
        storage: Arc::new(FakeStorage {
            log: Arc::clone(&log),
        }),
        auth: Arc::new(FakeAuth),
        video_host,
    };

    let shared = Arc::new(SharedState::with_backends(Config::default(), backends));
    let state = cinedex::api::create_app_state(shared, None);
    let router = cinedex::api::router(state).await;

    log.lock().unwrap().clear();
    TestApp { router, rest, log }
}

pub const BOUNDARY: &str = "cinedex-test-boundary";

/// One multipart part: field name, optional file name and content type, body.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn payload(value: &Value) -> Self {
        Self {
            name: "payload",
            file_name: None,
            content_type: None,
            body: value.to_string().into_bytes(),
        }
    }

    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            body: b"fake-bytes".to_vec(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n",
                part.name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn media_form_payload() -> Value {
    json!({
        "title": "Arrival",
        "type": "movie",
        "description": "Linguist meets heptapods.",
        "year": 2016,
        "duration": 116,
        "genres": [3, 7],
        "actors": [
            { "name": "Amy Adams", "character": "Louise Banks" },
            { "name": "   ", "character": "" }
        ],
        "directors": [{ "name": "Denis Villeneuve" }]
    })
}
