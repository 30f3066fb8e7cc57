use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{error::ErrorTranslator, handlers::rest, service::NoteService};

/// Shared state handed to every handler.
pub struct AppState {
    pub notes: NoteService,
    pub errors: ErrorTranslator,
}

impl AppState {
    pub const fn new(notes: NoteService, errors: ErrorTranslator) -> Self {
        Self { notes, errors }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(rest::root))
        .route("/health", get(rest::health))
        .route("/notes", get(rest::get_notes).post(rest::create_note))
        .route("/notes/export/all", get(rest::export_notes))
        .route("/notes/import", post(rest::import_notes))
        .route("/notes/trash/clear", delete(rest::clear_trash))
        .route(
            "/notes/{id}",
            get(rest::get_note)
                .put(rest::update_note)
                .delete(rest::delete_note),
        )
        .route("/notes/{id}/trash", delete(rest::trash_note))
        .route("/notes/{id}/restore", patch(rest::restore_note))
        .route("/notes/{id}/toggle-important", patch(rest::toggle_important))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", rest::ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
