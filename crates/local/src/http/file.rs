use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_MATCH, LAST_MODIFIED};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use tokio_util::io::ReaderStream;

use common::directory::GetFileQuery;

use crate::error::LocalError;
use crate::root::ServedRoot;

/// `Last-Modified` header value, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub async fn handler(
    State(root): State<ServedRoot>,
    Query(query): Query<GetFileQuery>,
    headers: HeaderMap,
) -> Result<Response, LocalError> {
    let if_match = headers
        .get(IF_MATCH)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let opened = root.open_file(&query.key, if_match).await?;
    tracing::debug!(key = %query.key, size = opened.size, "serving file");

    let headers = [
        (ETAG, opened.etag),
        (LAST_MODIFIED, http_date(&opened.last_modified)),
        (CONTENT_TYPE, "application/octet-stream".to_string()),
        (CONTENT_LENGTH, opened.size.to_string()),
    ];
    let body = Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(opened.file)));

    Ok((headers, body).into_response())
}
