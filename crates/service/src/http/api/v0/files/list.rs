use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use common::types::ProjectId;

use crate::gate::{ApprovedFile, GateError};
use crate::http::extract::LenientJson;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesRequest {
    /// e.g. `s3://bucket1`
    pub file_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_name: String,
    pub id: String,
    pub size: u64,
    pub approvals: Vec<String>,
}

impl From<ApprovedFile> for FileInfo {
    fn from(file: ApprovedFile) -> Self {
        FileInfo {
            file_name: file.metadata.name,
            id: file.metadata.id.to_string(),
            size: file.metadata.size,
            approvals: file.approvals.iter().map(ToString::to_string).collect(),
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(project_id): Path<String>,
    LenientJson(req): LenientJson<ListFilesRequest>,
) -> Result<impl IntoResponse, GateError> {
    let project_id = ProjectId::from(project_id);
    let files = state.gate().list(&project_id, &req.file_location).await?;
    tracing::debug!(project_id = %project_id, count = files.len(), "listed files");

    let files: Vec<FileInfo> = files.into_iter().map(FileInfo::from).collect();
    Ok(Json(files))
}
