use axum::routing::{get, put};
use axum::Router;

use crate::ServiceState;

pub mod approve;
pub mod download;
pub mod list;

pub use approve::ApproveFileRequest;
pub use download::DownloadFileRequest;
pub use list::{FileInfo, ListFilesRequest};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/:project_id/files", get(list::handler))
        .route("/:project_id/files/:file_id", get(download::handler))
        .route("/:project_id/files/:file_id/approve", put(approve::handler))
        .with_state(state)
}
