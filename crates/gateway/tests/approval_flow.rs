use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::prelude::{Engine, BASE64_STANDARD};
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tower::ServiceExt;

use common::ledger::MemoryLedger;
use common::storage::{MemoryBuckets, S3Storage, StorageBackends};
use common::types::strip_quotes;
use service::config::BasicAuthConfig;
use service::ServiceState;

fn gateway(buckets: Arc<MemoryBuckets>) -> Router {
    let storage = StorageBackends::new().with_s3(Arc::new(S3Storage::new(buckets)));
    let state = ServiceState::new(
        Arc::new(MemoryLedger::new()),
        storage,
        BasicAuthConfig {
            username: "egress".into(),
            password: "secret".into(),
        },
    );
    service::http::router(state)
}

async fn call(app: &Router, method: Method, uri: &str, body: serde_json::Value) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", BASE64_STANDARD.encode("egress:secret")),
        )
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes)
}

async fn put_object(buckets: &MemoryBuckets, key: &str, content: &'static [u8]) -> String {
    let put = buckets
        .store("exports")
        .put(&ObjectPath::from(key), Bytes::from_static(content).into())
        .await
        .unwrap();
    strip_quotes(&put.e_tag.unwrap()).to_string()
}

#[tokio::test]
async fn test_file_released_after_quorum() {
    let buckets = Arc::new(MemoryBuckets::new());
    let file_id = put_object(&buckets, "reports/summary.csv", b"a,b\n1,2\n").await;
    let app = gateway(buckets);

    let list_body = serde_json::json!({"file_location": "s3://exports"});
    let download_body = serde_json::json!({
        "files_location": "s3://exports",
        "required_approvals": 2,
        "max_file_size": 1024,
    });
    let file_uri = format!("/v0/study-7/files/{}", file_id);
    let approve_uri = format!("{}/approve", file_uri);

    let (status, body) = call(&app, Method::GET, "/v0/study-7/files", list_body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let listing: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        listing,
        serde_json::json!([{
            "file_name": "reports/summary.csv",
            "id": file_id,
            "size": 8,
            "approvals": [],
        }])
    );

    let (status, body) = call(&app, Method::GET, &file_uri, download_body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        &body[..],
        br#"{"message":"Required 2 approvals but only had 0"}"#
    );

    for user in ["alice", "alice", "bob"] {
        let (status, _) = call(
            &app,
            Method::PUT,
            &approve_uri,
            serde_json::json!({"user_id": user}),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, body) = call(&app, Method::GET, "/v0/study-7/files", list_body).await;
    let listing: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(listing[0]["approvals"], serde_json::json!(["alice", "bob"]));

    let (status, body) = call(&app, Method::GET, &file_uri, download_body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"a,b\n1,2\n");
}

#[tokio::test]
async fn test_approvals_do_not_follow_a_replaced_file() {
    let buckets = Arc::new(MemoryBuckets::new());
    let file_id = put_object(&buckets, "reports/summary.csv", b"approved bytes").await;
    let app = gateway(buckets.clone());

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/v0/study-7/files/{}/approve", file_id),
        serde_json::json!({"user_id": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let replaced_id = put_object(&buckets, "reports/summary.csv", b"something else").await;
    assert_ne!(file_id, replaced_id);

    let download_body = serde_json::json!({
        "files_location": "s3://exports",
        "required_approvals": 1,
        "max_file_size": 1024,
    });

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/v0/study-7/files/{}", file_id),
        download_body.clone(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/v0/study-7/files/{}", replaced_id),
        download_body,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_projects_do_not_share_approvals() {
    let buckets = Arc::new(MemoryBuckets::new());
    let file_id = put_object(&buckets, "data.bin", b"0123456789").await;
    let app = gateway(buckets);

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/v0/study-1/files/{}/approve", file_id),
        serde_json::json!({"user_id": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/v0/study-2/files/{}", file_id),
        serde_json::json!({
            "files_location": "s3://exports",
            "required_approvals": 1,
            "max_file_size": 1024,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
