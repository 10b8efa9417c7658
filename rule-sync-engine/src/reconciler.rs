//! Merges templates with existing rules and commits the replacement

use futures::future::join_all;
use rule_sync_core::{NewRuleInstance, PackagePolicy, RuleTemplate};
use rule_sync_storage::RuleInstanceStorage;
use uuid::Uuid;

use crate::{CleanupFailure, ExistingRules, SyncError};

/// Plan one new rule per template.
///
/// A rule inherits `enabled` from the existing rule with the same
/// `rego_rule_id`, otherwise it takes the template default.
pub fn reconcile(
    policy: &PackagePolicy,
    templates: &[RuleTemplate],
    existing: &ExistingRules,
) -> Vec<NewRuleInstance> {
    templates
        .iter()
        .map(|template| {
            let enabled = existing
                .get(template.rego_rule_id())
                .map_or(template.enabled, |rule| rule.enabled);
            NewRuleInstance::from_template(template, policy, enabled)
        })
        .collect()
}

/// What a successful commit did
#[derive(Debug, Clone, Default)]
pub struct CommitReport {
    pub created: Vec<Uuid>,
    pub deleted: usize,
    pub failed_deletions: Vec<CleanupFailure>,
}

/// Create the planned rules, then delete every existing one.
///
/// Deletion only starts once every planned rule has been created. When any
/// create fails, rules created by this call are removed again and the
/// existing rules are left as they were.
pub async fn commit(
    store: &dyn RuleInstanceStorage,
    policy: &PackagePolicy,
    planned: Vec<NewRuleInstance>,
    existing: &ExistingRules,
) -> Result<CommitReport, SyncError> {
    let attempted = planned.len();

    let results = store.bulk_create(planned).await.map_err(|source| {
        tracing::error!(
            "Failed to generate rules for package policy {} (policy {}): {}",
            policy.id,
            policy.policy_id,
            source
        );
        SyncError::Create {
            package_policy_id: policy.id.clone(),
            failed: attempted,
            attempted,
            source,
        }
    })?;

    let mut created = Vec::with_capacity(results.len());
    let mut failed = 0;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(rule) => created.push(rule.id),
            Err(e) => {
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(source) = first_error {
        tracing::error!(
            "Failed to create {} of {} rules for package policy {} (policy {}): {}",
            failed,
            attempted,
            policy.id,
            policy.policy_id,
            source
        );
        let (rolled_back, leftovers) = delete_all(store, created).await;
        for leftover in &leftovers {
            tracing::warn!(
                "Failed to roll back rule {} for package policy {}: {}",
                leftover.rule_id,
                policy.id,
                leftover.error
            );
        }
        tracing::debug!("Rolled back {} partially created rules", rolled_back);
        return Err(SyncError::Create {
            package_policy_id: policy.id.clone(),
            failed,
            attempted,
            source,
        });
    }

    tracing::info!(
        "Generated {} rules for package policy {} (policy {})",
        created.len(),
        policy.id,
        policy.policy_id
    );

    let (deleted, failed_deletions) = delete_all(store, existing.ids()).await;
    for failure in &failed_deletions {
        tracing::warn!(
            "Failed to delete stale rule {} for package policy {}: {}",
            failure.rule_id,
            policy.id,
            failure.error
        );
    }

    Ok(CommitReport {
        created,
        deleted,
        failed_deletions,
    })
}

/// Delete every id concurrently; returns the number deleted and the failures
pub(crate) async fn delete_all(
    store: &dyn RuleInstanceStorage,
    ids: Vec<Uuid>,
) -> (usize, Vec<CleanupFailure>) {
    let results = join_all(ids.iter().map(|id| store.delete(*id))).await;

    let mut deleted = 0;
    let mut failures = Vec::new();
    for (id, result) in ids.into_iter().zip(results) {
        match result {
            Ok(()) => deleted += 1,
            Err(e) => failures.push(CleanupFailure {
                rule_id: id,
                error: e.to_string(),
            }),
        }
    }
    (deleted, failures)
}
