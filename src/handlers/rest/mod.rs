pub mod extract;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use chrono::Utc;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    app::AppState,
    dto::{
        CreateNoteRequest, Envelope, ErrorBody, HealthResponse, ImportNotesRequest,
        ImportedNote, ListNotesParams, UpdateNoteRequest,
    },
    models::Note,
};

use extract::{ApiJson, ApiPath, ApiQuery};

#[derive(OpenApi)]
#[openapi(
    paths(
        get_notes,
        get_note,
        create_note,
        update_note,
        trash_note,
        delete_note,
        restore_note,
        toggle_important,
        export_notes,
        import_notes,
        clear_trash,
        health
    ),
    components(schemas(
        Note,
        CreateNoteRequest,
        UpdateNoteRequest,
        ImportNotesRequest,
        ImportedNote,
        ErrorBody,
        HealthResponse
    )),
    tags(
        (name = "notes", description = "Notes management API")
    )
)]
pub struct ApiDoc;

pub async fn root() -> Response {
    let body = serde_json::json!({
        "message": "Notes API is working",
        "endpoints": {
            "health": "GET /health",
            "list": "GET /notes?filter=&search=&sort=",
            "get": "GET /notes/{id}",
            "create": "POST /notes",
            "update": "PUT /notes/{id}",
            "trash": "DELETE /notes/{id}/trash",
            "delete": "DELETE /notes/{id}",
            "restore": "PATCH /notes/{id}/restore",
            "toggle_important": "PATCH /notes/{id}/toggle-important",
            "export": "GET /notes/export/all",
            "import": "POST /notes/import",
            "clear_trash": "DELETE /notes/trash/clear",
            "docs": "/swagger-ui"
        }
    });

    (StatusCode::OK, Json(body)).into_response()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let (status, label) = match state.notes.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    let body = HealthResponse {
        status: label.to_string(),
        timestamp: Utc::now(),
    };

    (status, Json(body)).into_response()
}

#[utoipa::path(
    get,
    path = "/notes",
    params(ListNotesParams),
    responses(
        (status = 200, description = "Filtered and sorted notes", body = Envelope<Vec<Note>>),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_notes(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListNotesParams>,
) -> Response {
    match state.notes.list_notes(params).await {
        Ok(notes) => {
            let count = notes.len() as u64;
            (StatusCode::OK, Json(Envelope::data(notes).with_count(count))).into_response()
        }
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = Envelope<Note>),
        (status = 404, description = "Note not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_note(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i64>) -> Response {
    match state.notes.get_note(id).await {
        Ok(note) => (StatusCode::OK, Json(Envelope::data(note))).into_response(),
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = Envelope<Note>),
        (status = 400, description = "Title or content missing", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateNoteRequest>,
) -> Response {
    match state.notes.create_note(payload).await {
        Ok(note) => (
            StatusCode::CREATED,
            Json(Envelope::data(note).with_message("Note created")),
        )
            .into_response(),
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = Envelope<Note>),
        (status = 400, description = "Title or content missing", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateNoteRequest>,
) -> Response {
    match state.notes.update_note(id, payload).await {
        Ok(note) => (
            StatusCode::OK,
            Json(Envelope::data(note).with_message("Note updated")),
        )
            .into_response(),
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}/trash",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note moved to trash"),
        (status = 404, description = "Note not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn trash_note(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i64>) -> Response {
    match state.notes.trash_note(id).await {
        Ok(()) => (StatusCode::OK, Json(Envelope::message("Note moved to trash"))).into_response(),
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note permanently deleted"),
        (status = 404, description = "Note not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match state.notes.delete_note(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(Envelope::message("Note permanently deleted")),
        )
            .into_response(),
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    patch,
    path = "/notes/{id}/restore",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note restored from trash"),
        (status = 404, description = "Note not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn restore_note(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match state.notes.restore_note(id).await {
        Ok(()) => (StatusCode::OK, Json(Envelope::message("Note restored"))).into_response(),
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    patch,
    path = "/notes/{id}/toggle-important",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Important flag flipped", body = Envelope<Note>),
        (status = 404, description = "Note not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn toggle_important(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match state.notes.toggle_important(id).await {
        Ok(note) => {
            let message = if note.important {
                "Note marked as important"
            } else {
                "Note unmarked as important"
            };
            (
                StatusCode::OK,
                Json(Envelope::data(note).with_message(message)),
            )
                .into_response()
        }
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    get,
    path = "/notes/export/all",
    responses(
        (status = 200, description = "Every note, trash included", body = Envelope<Vec<Note>>),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn export_notes(State(state): State<Arc<AppState>>) -> Response {
    match state.notes.export_notes().await {
        Ok(notes) => {
            let count = notes.len() as u64;
            (StatusCode::OK, Json(Envelope::data(notes).with_count(count))).into_response()
        }
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    post,
    path = "/notes/import",
    request_body = ImportNotesRequest,
    responses(
        (status = 200, description = "All notes imported"),
        (status = 400, description = "Payload is not a list of valid notes", body = ErrorBody),
        (status = 500, description = "Internal server error, nothing imported", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn import_notes(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ImportNotesRequest>,
) -> Response {
    match state.notes.import_notes(payload).await {
        Ok(imported) => (
            StatusCode::OK,
            Json(Envelope::message(format!("Imported {imported} notes")).with_count(imported)),
        )
            .into_response(),
        Err(e) => state.errors.respond(e),
    }
}

#[utoipa::path(
    delete,
    path = "/notes/trash/clear",
    responses(
        (status = 200, description = "Trash emptied"),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn clear_trash(State(state): State<Arc<AppState>>) -> Response {
    match state.notes.clear_trash().await {
        Ok(removed) => (
            StatusCode::OK,
            Json(Envelope::message("Trash cleared").with_count(removed)),
        )
            .into_response(),
        Err(e) => state.errors.respond(e),
    }
}
