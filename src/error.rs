use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio_postgres::error::SqlState;

use crate::{db::StorageError, dto::ErrorBody};

/// Failures surfaced by the notes service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or incomplete request; nothing was written.
    #[error("{0}")]
    Validation(String),

    /// An id-addressed operation named a note that does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Abstract failure kinds reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    pub fn from_sql_state(code: Option<&SqlState>) -> Self {
        match code {
            Some(code) if *code == SqlState::UNIQUE_VIOLATION => Self::Conflict,
            Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => Self::NotFound,
            Some(code) if *code == SqlState::STRING_DATA_RIGHT_TRUNCATION => Self::InvalidInput,
            _ => Self::Internal,
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation | Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn default_message(self) -> &'static str {
        match self {
            Self::Validation => "Validation error",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Data conflict",
            Self::InvalidInput => "Data too long",
            Self::Internal => "Internal server error",
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(e) => ErrorKind::from_sql_state(e.code()),
        }
    }
}

/// Turns [`ApiError`]s into error envelopes.
///
/// Storage failures get a generic message; their raw text is attached only
/// when `expose_details` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTranslator {
    expose_details: bool,
}

impl ErrorTranslator {
    pub const fn new(expose_details: bool) -> Self {
        Self { expose_details }
    }

    pub fn body(&self, err: &ApiError) -> (StatusCode, ErrorBody) {
        let kind = err.kind();

        let (message, detail) = match err {
            ApiError::Validation(message) | ApiError::NotFound(message) => (message.clone(), None),
            ApiError::Storage(e) => (
                kind.default_message().to_string(),
                Some(e.message().to_string()),
            ),
        };

        let body = ErrorBody {
            success: false,
            message,
            error: detail.filter(|_| self.expose_details),
        };

        (kind.status(), body)
    }

    pub fn respond(&self, err: ApiError) -> Response {
        let (status, body) = self.body(&err);

        if status.is_server_error() {
            tracing::error!("request failed: {err}");
        } else {
            tracing::warn!("request rejected ({}): {err}", status.as_u16());
        }

        (status, Json(body)).into_response()
    }
}
