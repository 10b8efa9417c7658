//! Engine error types

use rule_sync_storage::StorageError;
use thiserror::Error;

/// Failures that abort a reconciliation or removal before it changes anything
/// it should not. Stale-rule cleanup failures are not errors; they are
/// reported in [`crate::SyncReport`].
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch rule templates: {0}")]
    TemplateFetch(#[source] StorageError),

    #[error("Failed to fetch existing rules for package policy {package_policy_id}: {source}")]
    ExistingFetch {
        package_policy_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to create {failed} of {attempted} rules for package policy {package_policy_id}: {source}")]
    Create {
        package_policy_id: String,
        failed: usize,
        attempted: usize,
        #[source]
        source: StorageError,
    },
}
