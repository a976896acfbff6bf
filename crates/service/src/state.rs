use std::sync::Arc;

use common::ledger::{self, DynLedger, LedgerError};
use common::storage::{HttpStorage, S3Buckets, S3Storage, StorageBackends, StorageError};

use crate::config::{BasicAuthConfig, Config};
use crate::gate::Gate;

/// Main service state, shared by every request handler.
#[derive(Clone)]
pub struct State {
    gate: Gate,
    credentials: Arc<BasicAuthConfig>,
}

impl State {
    pub fn new(ledger: DynLedger, storage: StorageBackends, credentials: BasicAuthConfig) -> Self {
        Self {
            gate: Gate::new(ledger, storage),
            credentials: Arc::new(credentials),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup approval ledger
        let ledger = ledger::provider(&config.db).await?;

        // 2. Setup s3 backend
        let buckets = Arc::new(S3Buckets::new(config.s3.clone()));
        if let (Some(endpoint), Some(bucket)) = (&config.s3.endpoint, &config.s3.dev_bucket) {
            tracing::debug!(endpoint, bucket, "checking dev bucket");
            match buckets.verify_bucket(bucket).await {
                Ok(()) => tracing::info!(bucket, "dev bucket available"),
                Err(e) => tracing::warn!(bucket, error = %e, "dev bucket unavailable"),
            }
        }
        let mut storage = StorageBackends::new().with_s3(Arc::new(S3Storage::new(buckets)));

        // 3. Setup directory server backend
        if config.generic.enabled {
            storage = storage.with_generic(Arc::new(HttpStorage::new()?));
            tracing::info!("generic storage backend enabled");
        }

        Ok(Self::new(ledger, storage, config.auth.basic.clone()))
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn credentials(&self) -> &BasicAuthConfig {
        &self.credentials
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to setup the approval ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("failed to setup a storage backend: {0}")]
    Storage(#[from] StorageError),
}
