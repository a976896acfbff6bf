use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use common::types::{FileId, ProjectId};

use crate::gate::{GateError, ReleasePolicy};
use crate::http::extract::LenientJson;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadFileRequest {
    pub required_approvals: u64,
    /// e.g. `s3://bucket1`
    pub files_location: String,
    /// in bytes
    pub max_file_size: u64,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path((project_id, file_id)): Path<(String, String)>,
    LenientJson(req): LenientJson<DownloadFileRequest>,
) -> Result<Response, GateError> {
    let project_id = ProjectId::from(project_id);
    let file_id = FileId::normalized(&file_id);
    let policy = ReleasePolicy {
        required_approvals: req.required_approvals,
        max_file_size: req.max_file_size,
    };

    let file = state
        .gate()
        .download(&project_id, &file_id, &req.files_location, policy)
        .await?;

    let content = file.content.inspect_err(move |e| {
        tracing::error!(
            project_id = %project_id,
            file_id = %file_id,
            error = %e,
            "failed to stream file"
        );
    });

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(content),
    )
        .into_response())
}
