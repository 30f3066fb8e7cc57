#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tower::util::ServiceExt;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use notes_api::{
    app::{self, AppState},
    db::StorageError,
    error::ErrorTranslator,
    models::{Note, NoteDraft},
    repository::{ListQuery, NoteRepository},
    service::NoteService,
};

const TITLE_MAX_CHARS: usize = 255;

#[derive(Default)]
struct Table {
    notes: Vec<Note>,
    next_id: i64,
    clock: i64,
}

impl Table {
    /// Every write observes a strictly later timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(self.clock)
    }

    fn insert(&mut self, draft: &NoteDraft) -> Result<Note, StorageError> {
        check_title(draft)?;

        self.next_id += 1;
        let now = self.tick();
        let note = Note {
            id: self.next_id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            tags: draft.tags.clone(),
            important: draft.important,
            deleted: draft.deleted,
            created_at: now,
            updated_at: now,
        };
        self.notes.push(note.clone());

        Ok(note)
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id == id)
    }
}

fn check_title(draft: &NoteDraft) -> Result<(), StorageError> {
    if draft.title.chars().count() > TITLE_MAX_CHARS {
        return Err(StorageError::new(
            Some(SqlState::STRING_DATA_RIGHT_TRUNCATION),
            "value too long for type character varying(255)",
        ));
    }
    Ok(())
}

/// In-memory stand-in for the Postgres repository.
#[derive(Default)]
pub struct MemoryNoteRepository {
    table: Mutex<Table>,
    offline: AtomicBool,
}

impl MemoryNoteRepository {
    /// Makes every following call fail like an unreachable database.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<Note> {
        self.table.lock().unwrap().notes.clone()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Table>, StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::new(
                None,
                "connection pool error: connection refused",
            ));
        }
        Ok(self.table.lock().unwrap())
    }

    fn set_deleted(&self, id: i64, deleted: bool) -> Result<(), StorageError> {
        let mut table = self.guard()?;
        let now = table.tick();
        if let Some(note) = table.find_mut(id) {
            note.deleted = deleted;
            note.updated_at = now;
        }
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Note>, StorageError> {
        let table = self.guard()?;
        let mut notes: Vec<Note> = table
            .notes
            .iter()
            .filter(|note| query.matches(note))
            .cloned()
            .collect();
        // Title order is by code point, not the database collation.
        notes.sort_by(|a, b| query.sort().compare(a, b));
        Ok(notes)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Note>, StorageError> {
        let table = self.guard()?;
        Ok(table.notes.iter().find(|note| note.id == id).cloned())
    }

    async fn create(&self, draft: &NoteDraft) -> Result<Note, StorageError> {
        self.guard()?.insert(draft)
    }

    async fn update(&self, id: i64, draft: &NoteDraft) -> Result<Option<Note>, StorageError> {
        check_title(draft)?;

        let mut table = self.guard()?;
        let now = table.tick();
        Ok(table.find_mut(id).map(|note| {
            note.title.clone_from(&draft.title);
            note.content.clone_from(&draft.content);
            note.tags.clone_from(&draft.tags);
            note.important = draft.important;
            note.updated_at = now;
            note.clone()
        }))
    }

    async fn soft_delete(&self, id: i64) -> Result<(), StorageError> {
        self.set_deleted(id, true)
    }

    async fn restore(&self, id: i64) -> Result<(), StorageError> {
        self.set_deleted(id, false)
    }

    async fn hard_delete(&self, id: i64) -> Result<(), StorageError> {
        self.guard()?.notes.retain(|note| note.id != id);
        Ok(())
    }

    async fn toggle_important(&self, id: i64) -> Result<Option<Note>, StorageError> {
        let mut table = self.guard()?;
        let now = table.tick();
        Ok(table.find_mut(id).map(|note| {
            note.important = !note.important;
            note.updated_at = now;
            note.clone()
        }))
    }

    async fn clear_deleted(&self) -> Result<u64, StorageError> {
        let mut table = self.guard()?;
        let before = table.notes.len();
        table.notes.retain(|note| !note.deleted);
        Ok((before - table.notes.len()) as u64)
    }

    async fn export_all(&self) -> Result<Vec<Note>, StorageError> {
        let table = self.guard()?;
        let mut notes = table.notes.clone();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }

    async fn import_many(&self, drafts: Vec<NoteDraft>) -> Result<u64, StorageError> {
        let mut table = self.guard()?;

        // Work on a copy so a failing entry leaves the table untouched.
        let mut staged = Table {
            notes: table.notes.clone(),
            next_id: table.next_id,
            clock: table.clock,
        };
        for draft in &drafts {
            staged.insert(draft)?;
        }
        *table = staged;

        Ok(drafts.len() as u64)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.guard().map(|_| ())
    }
}

pub fn test_app(repo: Arc<MemoryNoteRepository>, expose_details: bool) -> Router {
    let service = NoteService::new(repo);
    let state = AppState::new(service, ErrorTranslator::new(expose_details));

    app::router(Arc::new(state))
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request.");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to call the router.");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body.");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON.")
    };

    (status, json)
}

pub fn ids(response: &Value) -> Vec<i64> {
    response["data"]
        .as_array()
        .expect("data is not an array")
        .iter()
        .map(|note| note["id"].as_i64().expect("note without id"))
        .collect()
}
