use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use common::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum LocalError {
    #[error("invalid prefix")]
    InvalidPrefix,

    #[error("invalid key")]
    InvalidKey,

    #[error("invalid If-Match header. ETag must be a quoted string, e.g. \"abc123\"")]
    InvalidETag,

    #[error("file not found")]
    NotFound,

    #[error("key must refer to a file, not a directory")]
    IsDirectory,

    #[error("key resolves outside the served directory")]
    Escape,

    #[error("ETag mismatch")]
    ETagMismatch,

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking filesystem task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LocalError {
    /// Sort an error from opening a key beneath the root.
    ///
    /// cap-std reports a path leaving the root as `PermissionDenied`, the
    /// same kind the OS uses for a file the server may not read. Only the
    /// former is a bad request.
    pub(crate) fn from_open(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                LocalError::NotFound
            }
            std::io::ErrorKind::IsADirectory => LocalError::IsDirectory,
            std::io::ErrorKind::PermissionDenied if is_escape(&err) => LocalError::Escape,
            _ => LocalError::Io(err),
        }
    }

    /// `None` when the failure has no classification, e.g. a panicked task.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            LocalError::InvalidPrefix
            | LocalError::InvalidKey
            | LocalError::InvalidETag
            | LocalError::IsDirectory
            | LocalError::Escape => Some(ErrorKind::InvalidInput),
            LocalError::NotFound | LocalError::ETagMismatch => Some(ErrorKind::NotFound),
            LocalError::Io(_) => Some(ErrorKind::ServerError),
            LocalError::Task(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        if let LocalError::ETagMismatch = self {
            return StatusCode::PRECONDITION_FAILED;
        }
        StatusCode::from_u16(common::status_code(self.kind()))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

fn is_escape(err: &std::io::Error) -> bool {
    err.raw_os_error().is_none() && err.to_string().contains(ESCAPE_MESSAGE)
}

/// Message cap-std attaches to errors for paths resolving outside the root.
const ESCAPE_MESSAGE: &str = "outside of the filesystem";

impl IntoResponse for LocalError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::info!(error = %self, status = %status, "request refused");
            self.to_string()
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
