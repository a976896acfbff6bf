use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::{NotReady, Probe};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// 200 once every dependency answers, 503 with the failing one otherwise.
#[tracing::instrument]
pub async fn handler(probe: Probe) -> Response {
    let result = timeout(HEALTH_CHECK_TIMEOUT, probe.check())
        .await
        .unwrap_or(Err(NotReady::TimedOut));

    match result {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response(),
        Err(e) => {
            tracing::warn!(reason = %e, "not ready");
            let msg = serde_json::json!({"status": "failure", "message": e.to_string()});
            (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
        }
    }
}
