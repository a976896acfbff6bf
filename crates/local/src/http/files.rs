use axum::extract::{Query, State};
use axum::Json;

use common::directory::{ListFilesQuery, ListFilesResponse};

use crate::error::LocalError;
use crate::root::ServedRoot;

pub async fn handler(
    State(root): State<ServedRoot>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ListFilesResponse>, LocalError> {
    let listing = root.list(&query.prefix).await?;
    tracing::debug!(
        prefix = %listing.prefix,
        file_count = listing.file_count,
        "listed files"
    );
    Ok(Json(listing))
}
