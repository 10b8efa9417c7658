//! Outcomes of reconciliation and removal

use rule_sync_core::BenchmarkId;
use serde::Serialize;
use uuid::Uuid;

/// A rule that could not be deleted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupFailure {
    pub rule_id: Uuid,
    pub error: String,
}

/// Result of regenerating the rules of one package policy
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub package_policy_id: String,
    pub policy_id: String,
    pub benchmark: BenchmarkId,
    pub created: usize,
    pub deleted: usize,
    /// Stale rules left behind; the next reconciliation deletes them
    pub failed_deletions: Vec<CleanupFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed_deletions.is_empty()
    }
}

/// Result of deleting the rules of a removed package policy
#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    pub package_policy_id: String,
    pub policy_id: String,
    pub deleted: usize,
    pub failed_deletions: Vec<CleanupFailure>,
}

impl RemovalReport {
    pub fn is_clean(&self) -> bool {
        self.failed_deletions.is_empty()
    }
}
