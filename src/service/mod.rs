use crate::{
    db::StorageError,
    dto::{CreateNoteRequest, ImportNotesRequest, ListNotesParams, UpdateNoteRequest},
    error::ApiError,
    models::Note,
    repository::NoteRepository,
};

use std::sync::Arc;

const NOTE_NOT_FOUND: &str = "Note not found";

/// Request-level note operations: validation, existence checks, then storage.
#[derive(Clone)]
pub struct NoteService {
    repo: Arc<dyn NoteRepository>,
}

impl NoteService {
    pub fn new(repo: Arc<dyn NoteRepository>) -> Self {
        Self { repo }
    }

    async fn existing(&self, id: i64) -> Result<Note, ApiError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))
    }

    pub async fn list_notes(&self, params: ListNotesParams) -> Result<Vec<Note>, ApiError> {
        let query = params.into_query();
        Ok(self.repo.list(&query).await?)
    }

    pub async fn get_note(&self, id: i64) -> Result<Note, ApiError> {
        self.existing(id).await
    }

    pub async fn create_note(&self, request: CreateNoteRequest) -> Result<Note, ApiError> {
        let draft = request.into_draft()?;
        let note = self.repo.create(&draft).await?;

        tracing::info!("Created note {}", note.id);

        Ok(note)
    }

    pub async fn update_note(&self, id: i64, request: UpdateNoteRequest) -> Result<Note, ApiError> {
        let draft = request.into_draft()?;
        self.existing(id).await?;

        self.repo
            .update(id, &draft)
            .await?
            .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))
    }

    pub async fn trash_note(&self, id: i64) -> Result<(), ApiError> {
        self.existing(id).await?;
        Ok(self.repo.soft_delete(id).await?)
    }

    pub async fn restore_note(&self, id: i64) -> Result<(), ApiError> {
        self.existing(id).await?;
        Ok(self.repo.restore(id).await?)
    }

    pub async fn delete_note(&self, id: i64) -> Result<(), ApiError> {
        self.existing(id).await?;
        self.repo.hard_delete(id).await?;

        tracing::info!("Permanently deleted note {}", id);

        Ok(())
    }

    pub async fn toggle_important(&self, id: i64) -> Result<Note, ApiError> {
        self.existing(id).await?;

        self.repo
            .toggle_important(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))
    }

    pub async fn export_notes(&self) -> Result<Vec<Note>, ApiError> {
        Ok(self.repo.export_all().await?)
    }

    pub async fn import_notes(&self, request: ImportNotesRequest) -> Result<u64, ApiError> {
        let drafts = request.into_drafts()?;
        Ok(self.repo.import_many(drafts).await?)
    }

    pub async fn clear_trash(&self) -> Result<u64, ApiError> {
        Ok(self.repo.clear_deleted().await?)
    }

    pub async fn ping(&self) -> Result<(), StorageError> {
        self.repo.ping().await
    }
}
