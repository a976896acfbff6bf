use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use common::types::{FileId, ProjectId, UserId};

use crate::gate::GateError;
use crate::http::extract::LenientJson;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveFileRequest {
    pub user_id: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path((project_id, file_id)): Path<(String, String)>,
    LenientJson(req): LenientJson<ApproveFileRequest>,
) -> Result<impl IntoResponse, GateError> {
    state
        .gate()
        .approve(
            &ProjectId::from(project_id),
            &FileId::normalized(&file_id),
            &UserId::from(req.user_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
