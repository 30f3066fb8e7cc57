use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::{Row, types::Json};
use utoipa::ToSchema;

/// Columns selected whenever a full note is read back.
pub const NOTE_COLUMNS: &str = "id, title, content, COALESCE(tags, '[]'::jsonb) AS tags, \
                                important, deleted, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note ID
    pub id: i64,
    /// Note title
    pub title: String,
    /// Note content
    pub content: String,
    /// Tag labels, in the order they were given
    pub tags: Vec<String>,
    /// Whether the note is flagged as important
    pub important: bool,
    /// Whether the note sits in the trash
    pub deleted: bool,
    /// Insertion time
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn from_row(row: &Row) -> Self {
        let Json(tags): Json<Vec<String>> = row.get("tags");

        Self {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            tags,
            important: row.get("important"),
            deleted: row.get("deleted"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Validated field set written by create, update and import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub important: bool,
    pub deleted: bool,
}

impl NoteDraft {
    /// Tags as stored: an empty list is persisted as SQL `NULL`.
    pub fn stored_tags(&self) -> Option<Json<&[String]>> {
        if self.tags.is_empty() {
            None
        } else {
            Some(Json(self.tags.as_slice()))
        }
    }
}
