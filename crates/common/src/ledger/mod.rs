//! Approval ledger: who approved which file, per project.
//!
//! Approvals are append-only and idempotent per reviewer: a reviewer approving
//! the same file twice is recorded once. Both backends enforce this, so the
//! length of a [`FileApprovals`](crate::types::FileApprovals) list is its
//! number of distinct reviewers.

mod memory;
mod sql;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ErrorKind;
use crate::types::{FileId, ProjectApprovals, ProjectId, UserId};

pub use memory::MemoryLedger;
pub use sql::SqlLedger;

/// Upper bound on how long a readiness probe may wait on the backing store.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait ApprovalLedger: Send + Sync {
    /// Record that `user_id` approved `file_id` within `project_id`.
    async fn approve(
        &self,
        project_id: &ProjectId,
        file_id: &FileId,
        user_id: &UserId,
    ) -> Result<(), LedgerError>;

    /// Every approval recorded for a project. Unknown projects yield an empty map.
    async fn approvals_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<ProjectApprovals, LedgerError>;

    /// Whether the backing store can currently serve requests.
    async fn is_ready(&self) -> bool;
}

pub type DynLedger = Arc<dyn ApprovalLedger>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerProvider {
    #[default]
    InMemory,
    Sql,
}

/// Ledger section of the service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub provider: LedgerProvider,
    /// Connection URL, `postgres://…` or `sqlite:…`. Required by the sql provider.
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Build the ledger selected by configuration.
pub async fn provider(config: &LedgerConfig) -> Result<DynLedger, LedgerError> {
    match config.provider {
        LedgerProvider::InMemory => {
            tracing::warn!("using in-memory approval ledger, approvals are lost on restart");
            Ok(Arc::new(MemoryLedger::new()))
        }
        LedgerProvider::Sql => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| LedgerError::Config("db.url is required for the sql provider".into()))?;
            let url = sql::build_url_with_auth(
                url,
                config.username.as_deref(),
                config.password.as_deref(),
            )?;
            let ledger = SqlLedger::connect(&url).await?;
            Ok(Arc::new(ledger))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to execute query: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("invalid ledger configuration: {0}")]
    Config(String),

    #[error("requested database type was not recognized: {0}")]
    UnknownDbType(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ServerError
    }
}
