use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use http::request::Parts;

use crate::gate::Gate;
use crate::ServiceState;

/// Something `/ready` must hear back from before traffic is routed here.
#[async_trait]
pub trait ReadinessProbe {
    async fn check(&self) -> Result<(), NotReady>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotReady {
    #[error("approval ledger isn't available")]
    Ledger,

    #[error("readiness check timed out")]
    TimedOut,
}

pub type DynProbe = Arc<dyn ReadinessProbe + Send + Sync>;

/// Extractor handing the readiness handler the probe for the current state.
pub struct Probe(DynProbe);

impl Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe").finish()
    }
}

impl Probe {
    pub fn new(probe: DynProbe) -> Self {
        Self(probe)
    }
}

impl Deref for Probe {
    type Target = DynProbe;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

struct GateProbe {
    gate: Gate,
}

#[async_trait]
impl ReadinessProbe for GateProbe {
    async fn check(&self) -> Result<(), NotReady> {
        if self.gate.is_ready().await {
            Ok(())
        } else {
            Err(NotReady::Ledger)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Probe
where
    ServiceState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ();

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ServiceState::from_ref(state);
        Ok(Probe::new(Arc::new(GateProbe {
            gate: state.gate().clone(),
        })))
    }
}
