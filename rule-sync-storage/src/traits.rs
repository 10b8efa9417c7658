//! Storage traits defining the interface for persistence

use async_trait::async_trait;
use rule_sync_core::{NewRuleInstance, RuleInstance, RuleTemplate};
use uuid::Uuid;

use crate::{Page, PageRequest, RuleFilter, StorageError};

/// Per-item outcome of a bulk create, in request order
pub type BulkCreateResult = Vec<Result<RuleInstance, StorageError>>;

/// Trait for rule template storage operations
#[async_trait]
pub trait RuleTemplateStorage: Send + Sync {
    /// Save a rule template
    async fn save(&self, template: RuleTemplate) -> Result<RuleTemplate, StorageError>;

    /// List one page of rule templates, in creation order
    async fn list(&self, page: PageRequest) -> Result<Page<RuleTemplate>, StorageError>;
}

/// Trait for generated rule instance storage operations
#[async_trait]
pub trait RuleInstanceStorage: Send + Sync {
    /// Find one page of rule instances matching the filter
    async fn find(&self, filter: &RuleFilter, page: PageRequest) -> Result<Page<RuleInstance>, StorageError>;

    /// Create many rule instances.
    ///
    /// An outer error means nothing was written. Inner errors are per item;
    /// the other items of the batch may have been created.
    async fn bulk_create(&self, rules: Vec<NewRuleInstance>) -> Result<BulkCreateResult, StorageError>;

    /// Delete a rule instance
    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;

    /// Apply a user override of the enabled flag
    async fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<RuleInstance, StorageError>;
}
