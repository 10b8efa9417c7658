//! Rule synchronization service driven by package policy lifecycle events

use rule_sync_core::PackagePolicy;
use rule_sync_storage::{PageRequest, RuleFilter, RuleInstanceStorage, RuleTemplateStorage, Storage};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::reconciler::delete_all;
use crate::{
    commit, load_existing, load_templates, reconcile, resolve_benchmark, PolicyLocks, RemovalReport,
    SyncConfig, SyncError, SyncReport,
};

/// Keeps the rule instances of package policies in line with their templates
pub struct RuleSync {
    templates: Arc<dyn RuleTemplateStorage>,
    rules: Arc<dyn RuleInstanceStorage>,
    locks: PolicyLocks,
    config: SyncConfig,
}

impl RuleSync {
    pub fn new(
        templates: Arc<dyn RuleTemplateStorage>,
        rules: Arc<dyn RuleInstanceStorage>,
        config: SyncConfig,
    ) -> Self {
        Self {
            templates,
            rules,
            locks: PolicyLocks::new(),
            config,
        }
    }

    /// Use one backend for both templates and rules
    pub fn with_storage<S: Storage + 'static>(storage: Arc<S>, config: SyncConfig) -> Self {
        Self::new(storage.clone(), storage, config)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    async fn lock_for(&self, policy: &PackagePolicy) -> Option<OwnedMutexGuard<()>> {
        if self.config.serialize_per_policy {
            Some(self.locks.acquire(&policy.policy_id).await)
        } else {
            None
        }
    }

    /// Regenerate the rules of a created or upgraded package policy
    pub async fn sync_policy(&self, policy: &PackagePolicy) -> Result<SyncReport, SyncError> {
        let _guard = self.lock_for(policy).await;

        let benchmark = resolve_benchmark(&policy.inputs);
        let existing = load_existing(
            self.rules.as_ref(),
            &policy.policy_id,
            &policy.id,
            self.config.page_size,
        )
        .await?;
        let templates = load_templates(self.templates.as_ref(), &benchmark, self.config.page_size).await?;

        let planned = reconcile(policy, &templates, &existing);
        tracing::debug!(
            "Planned {} rules for package policy {} from benchmark {}, replacing {}",
            planned.len(),
            policy.id,
            benchmark,
            existing.len()
        );

        let committed = commit(self.rules.as_ref(), policy, planned, &existing).await?;

        Ok(SyncReport {
            package_policy_id: policy.id.clone(),
            policy_id: policy.policy_id.clone(),
            benchmark,
            created: committed.created.len(),
            deleted: committed.deleted,
            failed_deletions: committed.failed_deletions,
        })
    }

    /// Delete every rule of a removed package policy.
    ///
    /// Each deletion is attempted regardless of the others failing.
    pub async fn remove_policy_rules(&self, policy: &PackagePolicy) -> Result<RemovalReport, SyncError> {
        let _guard = self.lock_for(policy).await;

        let existing = load_existing(
            self.rules.as_ref(),
            &policy.policy_id,
            &policy.id,
            self.config.page_size,
        )
        .await?;
        let (deleted, failed_deletions) = delete_all(self.rules.as_ref(), existing.ids()).await;

        if failed_deletions.is_empty() {
            tracing::info!(
                "Deleted {} rules after delete package policy {}",
                deleted,
                policy.id
            );
        } else {
            for failure in &failed_deletions {
                tracing::error!(
                    "Failed to delete rule {} after delete package policy {}: {}",
                    failure.rule_id,
                    policy.id,
                    failure.error
                );
            }
        }

        Ok(RemovalReport {
            package_policy_id: policy.id.clone(),
            policy_id: policy.policy_id.clone(),
            deleted,
            failed_deletions,
        })
    }

    /// Whether any generated rule exists at all
    pub async fn is_package_installed(&self) -> bool {
        match self.rules.find(&RuleFilter::all(), PageRequest::first(1)).await {
            Ok(page) => page.total > 0,
            Err(e) => {
                tracing::error!("Failed to check for installed rules: {}", e);
                false
            }
        }
    }
}
