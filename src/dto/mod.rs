use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    models::NoteDraft,
    repository::{Filter, ListQuery, Sort},
};

/// Success envelope wrapped around every non-error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl<T> Envelope<T> {
    pub const fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            count: None,
        }
    }
}

/// Body of every failed response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    /// Raw error detail, only present outside production
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotesParams {
    /// `all` (default), `important` or `deleted`
    pub filter: Option<String>,
    /// Substring looked up in title, content and tags
    pub search: Option<String>,
    /// `newest` (default), `oldest`, `alpha-asc`, `alpha-desc` or `important`
    pub sort: Option<String>,
}

impl ListNotesParams {
    pub fn into_query(self) -> ListQuery {
        ListQuery::new(
            self.filter.as_deref().map_or_else(Filter::default, Filter::parse),
            self.search.as_deref(),
            self.sort.as_deref().map_or_else(Sort::default, Sort::parse),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    /// Note title, required
    pub title: Option<String>,
    /// Note content, required
    pub content: Option<String>,
    /// Tag labels
    pub tags: Option<Vec<String>>,
    /// Important flag, defaults to false
    pub important: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    /// Note title, required
    pub title: Option<String>,
    /// Note content, required
    pub content: Option<String>,
    /// Tag labels; omitting them clears the note's tags
    pub tags: Option<Vec<String>>,
    /// Important flag; omitting it clears the flag
    pub important: Option<bool>,
}

/// One entry of an import payload. Unknown fields such as `id` or
/// `createdAt` from an export are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportedNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub important: Option<bool>,
    pub deleted: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportNotesRequest {
    /// Notes to insert; must be an array
    #[schema(value_type = Vec<ImportedNote>)]
    pub notes: Option<serde_json::Value>,
}

const TITLE_AND_CONTENT_REQUIRED: &str = "Title and content are required";

fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn draft(
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    important: Option<bool>,
    deleted: Option<bool>,
) -> Result<NoteDraft, ApiError> {
    let (Some(title), Some(content)) = (required(title), required(content)) else {
        return Err(ApiError::Validation(TITLE_AND_CONTENT_REQUIRED.to_string()));
    };

    Ok(NoteDraft {
        title,
        content,
        tags: tags.unwrap_or_default(),
        important: important.unwrap_or(false),
        deleted: deleted.unwrap_or(false),
    })
}

impl CreateNoteRequest {
    pub fn into_draft(self) -> Result<NoteDraft, ApiError> {
        draft(self.title, self.content, self.tags, self.important, None)
    }
}

impl UpdateNoteRequest {
    pub fn into_draft(self) -> Result<NoteDraft, ApiError> {
        draft(self.title, self.content, self.tags, self.important, None)
    }
}

impl ImportNotesRequest {
    pub fn into_drafts(self) -> Result<Vec<NoteDraft>, ApiError> {
        let Some(serde_json::Value::Array(entries)) = self.notes else {
            return Err(ApiError::Validation("Invalid data format".to_string()));
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let note: ImportedNote = serde_json::from_value(entry).map_err(|e| {
                    ApiError::Validation(format!("Invalid note at index {index}: {e}"))
                })?;

                draft(
                    note.title,
                    note.content,
                    note.tags,
                    note.important,
                    note.deleted,
                )
                .map_err(|_| {
                    ApiError::Validation(format!(
                        "Invalid note at index {index}: {TITLE_AND_CONTENT_REQUIRED}"
                    ))
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `OK` or `unavailable`
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
