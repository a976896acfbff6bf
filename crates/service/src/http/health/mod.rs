use axum::routing::get;
use axum::Router;

pub mod data_source;
pub mod liveness;
pub mod readiness;

use crate::ServiceState;

/// Probes, served without authentication.
pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/ping", get(liveness::handler))
        .route("/ready", get(readiness::handler))
        .with_state(state)
}
