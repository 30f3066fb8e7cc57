pub mod query;

use async_trait::async_trait;
use tokio_postgres::types::ToSql;

use crate::{
    db::{Database, StorageError},
    models::{NOTE_COLUMNS, Note, NoteDraft},
};

pub use query::{Filter, ListQuery, Predicate, Sort};

/// Storage operations on notes.
///
/// Id-addressed mutations do not report whether the id existed; callers check
/// with [`NoteRepository::get_by_id`] first.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Note>, StorageError>;

    /// Returns the note whether or not it is in the trash.
    async fn get_by_id(&self, id: i64) -> Result<Option<Note>, StorageError>;

    async fn create(&self, draft: &NoteDraft) -> Result<Note, StorageError>;

    /// Replaces title, content, tags and the important flag.
    async fn update(&self, id: i64, draft: &NoteDraft) -> Result<Option<Note>, StorageError>;

    async fn soft_delete(&self, id: i64) -> Result<(), StorageError>;

    async fn restore(&self, id: i64) -> Result<(), StorageError>;

    async fn hard_delete(&self, id: i64) -> Result<(), StorageError>;

    async fn toggle_important(&self, id: i64) -> Result<Option<Note>, StorageError>;

    /// Permanently removes every note in the trash, returning how many went.
    async fn clear_deleted(&self) -> Result<u64, StorageError>;

    /// Every note, trash included, last modified first.
    async fn export_all(&self) -> Result<Vec<Note>, StorageError>;

    /// Inserts all drafts as new notes, or none of them.
    async fn import_many(&self, drafts: Vec<NoteDraft>) -> Result<u64, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;
}

pub struct PgNoteRepository {
    db: Database,
}

impl PgNoteRepository {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    async fn set_deleted(&self, id: i64, deleted: bool) -> Result<(), StorageError> {
        self.db
            .execute(
                "UPDATE notes SET deleted = $1, updated_at = NOW() WHERE id = $2",
                &[&deleted, &id],
            )
            .await?;

        Ok(())
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Note>, StorageError> {
        let (sql, params) = query.to_sql();
        tracing::debug!("listing notes: {sql}; params: {params:?}");

        let params: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|param| param as &(dyn ToSql + Sync))
            .collect();

        let rows = self.db.query(&sql, &params).await?;

        Ok(rows.iter().map(Note::from_row).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Note>, StorageError> {
        let row = self
            .db
            .query_opt(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1"),
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(Note::from_row))
    }

    async fn create(&self, draft: &NoteDraft) -> Result<Note, StorageError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "INSERT INTO notes (title, content, tags, important) \
                     VALUES ($1, $2, $3, $4) RETURNING {NOTE_COLUMNS}"
                ),
                &[
                    &draft.title,
                    &draft.content,
                    &draft.stored_tags(),
                    &draft.important,
                ],
            )
            .await?;

        Ok(Note::from_row(&row))
    }

    async fn update(&self, id: i64, draft: &NoteDraft) -> Result<Option<Note>, StorageError> {
        let row = self
            .db
            .query_opt(
                &format!(
                    "UPDATE notes SET title = $1, content = $2, tags = $3, important = $4, \
                     updated_at = NOW() WHERE id = $5 RETURNING {NOTE_COLUMNS}"
                ),
                &[
                    &draft.title,
                    &draft.content,
                    &draft.stored_tags(),
                    &draft.important,
                    &id,
                ],
            )
            .await?;

        Ok(row.as_ref().map(Note::from_row))
    }

    async fn soft_delete(&self, id: i64) -> Result<(), StorageError> {
        self.set_deleted(id, true).await
    }

    async fn restore(&self, id: i64) -> Result<(), StorageError> {
        self.set_deleted(id, false).await
    }

    async fn hard_delete(&self, id: i64) -> Result<(), StorageError> {
        self.db
            .execute("DELETE FROM notes WHERE id = $1", &[&id])
            .await?;

        Ok(())
    }

    async fn toggle_important(&self, id: i64) -> Result<Option<Note>, StorageError> {
        let row = self
            .db
            .query_opt(
                &format!(
                    "UPDATE notes SET important = NOT important, updated_at = NOW() \
                     WHERE id = $1 RETURNING {NOTE_COLUMNS}"
                ),
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(Note::from_row))
    }

    async fn clear_deleted(&self) -> Result<u64, StorageError> {
        let removed = self
            .db
            .execute("DELETE FROM notes WHERE deleted = TRUE", &[])
            .await?;

        tracing::info!("Cleared {} notes from trash", removed);

        Ok(removed)
    }

    async fn export_all(&self) -> Result<Vec<Note>, StorageError> {
        let rows = self
            .db
            .query(
                &format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY updated_at DESC, id DESC"),
                &[],
            )
            .await?;

        Ok(rows.iter().map(Note::from_row).collect())
    }

    async fn import_many(&self, drafts: Vec<NoteDraft>) -> Result<u64, StorageError> {
        let imported = self
            .db
            .with_transaction(move |tx| {
                Box::pin(async move {
                    let statement = tx
                        .prepare(
                            "INSERT INTO notes (title, content, tags, important, deleted) \
                             VALUES ($1, $2, $3, $4, $5)",
                        )
                        .await?;

                    let mut inserted: u64 = 0;
                    for draft in &drafts {
                        inserted += tx
                            .execute(
                                &statement,
                                &[
                                    &draft.title,
                                    &draft.content,
                                    &draft.stored_tags(),
                                    &draft.important,
                                    &draft.deleted,
                                ],
                            )
                            .await?;
                    }

                    Ok(inserted)
                })
            })
            .await?;

        tracing::info!("Imported {} notes", imported);

        Ok(imported)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.db.ping().await
    }
}
