//! The download gate: files leave only once enough reviewers approved them,
//! and only as the exact bytes they approved.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use common::ledger::{DynLedger, LedgerError};
use common::location::{BackendKind, Location, LocationError};
use common::storage::{DynStorage, StorageBackends, StorageError};
use common::types::{File, FileApprovals, FileId, FileMetadata, ProjectId, UserId};
use common::ErrorKind;

/// A listed file joined with the approvals recorded against its content id.
#[derive(Debug, Clone)]
pub struct ApprovedFile {
    pub metadata: FileMetadata,
    pub approvals: FileApprovals,
}

/// Caller-supplied release policy for one download.
#[derive(Debug, Clone, Copy)]
pub struct ReleasePolicy {
    pub required_approvals: u64,
    pub max_file_size: u64,
}

#[derive(Clone)]
pub struct Gate {
    ledger: DynLedger,
    storage: StorageBackends,
}

impl Gate {
    pub fn new(ledger: DynLedger, storage: StorageBackends) -> Self {
        Self { ledger, storage }
    }

    fn backend(&self, location: &Location) -> Result<&DynStorage, GateError> {
        self.storage
            .for_location(location)
            .ok_or(GateError::BackendNotConfigured(location.kind()))
    }

    /// Files at `files_location`, in storage order, with their approvals.
    pub async fn list(
        &self,
        project_id: &ProjectId,
        files_location: &str,
    ) -> Result<Vec<ApprovedFile>, GateError> {
        let location = Location::parse(files_location)?;
        let storage = self.backend(&location)?;
        let approvals = self.ledger.approvals_for_project(project_id).await?;
        let files = storage.list(&location).await?;

        Ok(files
            .into_iter()
            .map(|metadata| ApprovedFile {
                approvals: approvals.file_approvals(&metadata.id),
                metadata,
            })
            .collect())
    }

    pub async fn approve(
        &self,
        project_id: &ProjectId,
        file_id: &FileId,
        user_id: &UserId,
    ) -> Result<(), GateError> {
        self.ledger.approve(project_id, file_id, user_id).await?;
        tracing::info!(project_id = %project_id, file_id = %file_id, user_id = %user_id, "file approved");
        Ok(())
    }

    /// Open `file_id` for release if `policy` allows it.
    ///
    /// Checks run in a fixed order: location, approvals, existence, size. A
    /// refused file is dropped before any byte is read from it.
    pub async fn download(
        &self,
        project_id: &ProjectId,
        file_id: &FileId,
        files_location: &str,
        policy: ReleasePolicy,
    ) -> Result<File, GateError> {
        let location = Location::parse(files_location)?;
        let storage = self.backend(&location)?;

        let approvals = self
            .ledger
            .approvals_for_project(project_id)
            .await?
            .file_approvals(file_id);
        let had = approvals.distinct_count() as u64;
        if had < policy.required_approvals {
            return Err(GateError::InsufficientApprovals {
                required: policy.required_approvals,
                had,
            });
        }

        let file = storage.get(&location, file_id).await?;
        if file.size > policy.max_file_size {
            return Err(GateError::TooLarge {
                size: file.size,
                max: policy.max_file_size,
            });
        }

        tracing::info!(
            project_id = %project_id,
            file_id = %file_id,
            size = file.size,
            approvals = had,
            "releasing file"
        );
        Ok(file)
    }

    pub async fn is_ready(&self) -> bool {
        self.ledger.is_ready().await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Invalid object. Failed to parse request body")]
    InvalidBody,

    #[error("Invalid object. Failed to parse file location")]
    Location(#[from] LocationError),

    #[error("no {0} storage backend is configured")]
    BackendNotConfigured(BackendKind),

    #[error("approval ledger failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("storage backend failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Required {required} approvals but only had {had}")]
    InsufficientApprovals { required: u64, had: u64 },

    #[error("Size [{size}] was greater than max [{max}]")]
    TooLarge { size: u64, max: u64 },
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::InvalidBody
            | GateError::Location(_)
            | GateError::InsufficientApprovals { .. }
            | GateError::TooLarge { .. } => ErrorKind::InvalidInput,
            GateError::BackendNotConfigured(_) | GateError::Ledger(_) => ErrorKind::ServerError,
            GateError::Storage(e) => match e {
                // a location the backend cannot address was still a bad request
                StorageError::Location(_) => ErrorKind::InvalidInput,
                e => e.kind(),
            },
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = StatusCode::from_u16(kind.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match kind {
            ErrorKind::ServerError => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            _ => {
                tracing::info!(error = %self, status = %status, "request refused");
                self.to_string()
            }
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
