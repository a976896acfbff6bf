//! HTTP surface of the directory server: `GET /files`, `GET /file` and a
//! liveness probe, all without authentication.

use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use service::http::health::liveness;
use service::http::{not_found_handler, Config, HttpServerError};

use crate::root::ServedRoot;

pub mod file;
pub mod files;

pub fn router(root: ServedRoot) -> Router {
    Router::new()
        .route("/files", get(files::handler))
        .route("/file", get(file::handler))
        .route("/ping", get(liveness::handler))
        .fallback(not_found_handler)
        .with_state(root)
}

/// Serve `root` until `shutdown_rx` fires.
pub async fn run(
    config: Config,
    root: ServedRoot,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(config.log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(root).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "directory server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use common::directory::ListFilesResponse;

    use super::*;

    fn app() -> (TempDir, Router) {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("hello.txt"), b"hello world").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/data.bin"), b"0123").unwrap();
        let root = ServedRoot::open(tmp.path()).unwrap();
        (tmp, router(root))
    }

    async fn get(app: &Router, uri: &str, if_match: Option<&str>) -> axum::response::Response {
        let mut request = Request::get(uri);
        if let Some(etag) = if_match {
            request = request.header(header::IF_MATCH, etag);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn listing(app: &Router, uri: &str) -> ListFilesResponse {
        let response = get(app, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_files() {
        let (_tmp, app) = app();

        let all = listing(&app, "/files").await;
        assert_eq!(all.file_count, 2);
        assert_eq!(all.files[0].key, "hello.txt");
        assert_eq!(all.files[1].key, "nested/data.bin");

        let nested = listing(&app, "/files?prefix=nested").await;
        assert_eq!(nested.prefix, "nested");
        assert_eq!(nested.files.len(), 1);
        assert_eq!(nested.files[0].size, 4);
    }

    #[tokio::test]
    async fn test_invalid_prefixes() {
        let (_tmp, app) = app();
        for uri in ["/files?prefix=../", "/files?prefix=/etc"] {
            let response = get(&app, uri, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                serde_json::json!({"message": "invalid prefix"})
            );
        }
    }

    #[tokio::test]
    async fn test_get_file() {
        let (_tmp, app) = app();
        let entry = listing(&app, "/files?prefix=hello").await.files.remove(0);

        let response = get(&app, "/file?key=hello.txt", Some(&entry.etag)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ETAG], entry.etag.as_str());
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            file::http_date(&entry.last_modified).as_str()
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn test_get_file_refusals() {
        let (_tmp, app) = app();
        let etag = "\"0000\"";

        let response = get(&app, "/file?key=..%2Fsecret.txt", Some(etag)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "invalid key"})
        );

        let response = get(&app, "/file", Some(etag)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&app, "/file?key=hello.txt", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "message": "invalid If-Match header. ETag must be a quoted string, e.g. \"abc123\""
            })
        );

        let response = get(&app, "/file?key=missing.txt", Some(etag)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "file not found"})
        );

        let response = get(&app, "/file?key=nested", Some(etag)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&app, "/file?key=hello.txt", Some(etag)).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "ETag mismatch"})
        );
    }

    #[tokio::test]
    async fn test_ping_and_unknown_route() {
        let (_tmp, app) = app();
        assert_eq!(get(&app, "/ping", None).await.status(), StatusCode::OK);
        assert_eq!(get(&app, "/nope", None).await.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_http_date() {
        let time = chrono::DateTime::from_timestamp(784111777, 0).unwrap();
        assert_eq!(file::http_date(&time), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
