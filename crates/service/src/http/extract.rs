use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::gate::GateError;

/// JSON body read from the raw bytes, whatever the `Content-Type` and
/// method. Any failure is [`GateError::InvalidBody`].
#[derive(Debug, Clone)]
pub struct LenientJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::info!(error = %e, "failed to read request body");
            GateError::InvalidBody
        })?;

        serde_json::from_slice(&body).map(LenientJson).map_err(|e| {
            tracing::info!(error = %e, "failed to parse request body");
            GateError::InvalidBody
        })
    }
}
