//! HTTP surface of the gateway: probes at the root, the approval API under
//! `/v0` behind basic auth.

use axum::middleware::from_fn_with_state;
use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
pub mod auth;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod health;

pub use config::Config;
pub use handlers::not_found_handler;

use crate::ServiceState;

const API_PREFIX: &str = "/v0";

/// Every route of the gateway, without the tracing layer.
pub fn router(state: ServiceState) -> Router {
    let api = api::router(state.clone())
        .layer(from_fn_with_state(state.clone(), auth::require_basic_auth));

    Router::new()
        .merge(health::router(state.clone()))
        .nest(API_PREFIX, api)
        .fallback(not_found_handler)
        .with_state(state)
}

/// Run the gateway HTTP server until `shutdown_rx` fires.
pub async fn run_api(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
