use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ApprovalLedger, LedgerError};
use crate::types::{FileId, ProjectApprovals, ProjectId, UserId};

/// Process-local ledger. Approvals live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<HashMap<ProjectId, ProjectApprovals>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApprovalLedger for MemoryLedger {
    async fn approve(
        &self,
        project_id: &ProjectId,
        file_id: &FileId,
        user_id: &UserId,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let approvals = state
            .entry(project_id.clone())
            .or_default()
            .entry(file_id.clone());

        if !approvals.contains(user_id) {
            approvals.push(user_id.clone());
        }
        Ok(())
    }

    async fn approvals_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<ProjectApprovals, LedgerError> {
        let state = self.state.read();
        Ok(state.get(project_id).cloned().unwrap_or_default())
    }

    async fn is_ready(&self) -> bool {
        true
    }
}
