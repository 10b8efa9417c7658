//! Package policy lifecycle callbacks and their registration point
//!
//! Callbacks are plain function values. A host registers them per
//! [`LifecycleEvent`] and dispatches events to whatever is registered.
//! Callbacks never fail: rule sync is best-effort relative to the policy
//! lifecycle, so errors are logged and folded into a [`HookOutcome`].

use futures::future::{BoxFuture, FutureExt};
use rule_sync_core::{BenchmarkId, LifecycleEvent, PackagePolicy};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{CleanupFailure, RemovalReport, RuleSync, SyncError, SyncReport};

/// A lifecycle callback
pub type PolicyCallback = Arc<dyn Fn(PackagePolicy) -> BoxFuture<'static, HookOutcome> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    Synced,
    /// New rules are live but some superseded rules could not be deleted
    SyncedWithStaleRules,
    Removed,
    RemovedWithFailures,
    Failed,
}

/// What a callback did for one package policy
#[derive(Debug, Clone, Serialize)]
pub struct HookOutcome {
    pub event: LifecycleEvent,
    pub package_policy_id: String,
    pub policy_id: String,
    pub status: HookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkId>,
    pub created: usize,
    pub deleted: usize,
    pub failed_deletions: Vec<CleanupFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HookOutcome {
    fn synced(event: LifecycleEvent, report: SyncReport) -> Self {
        let status = if report.is_clean() {
            HookStatus::Synced
        } else {
            HookStatus::SyncedWithStaleRules
        };
        Self {
            event,
            package_policy_id: report.package_policy_id,
            policy_id: report.policy_id,
            status,
            benchmark: Some(report.benchmark),
            created: report.created,
            deleted: report.deleted,
            failed_deletions: report.failed_deletions,
            error: None,
        }
    }

    fn removed(report: RemovalReport) -> Self {
        let status = if report.is_clean() {
            HookStatus::Removed
        } else {
            HookStatus::RemovedWithFailures
        };
        Self {
            event: LifecycleEvent::Deleted,
            package_policy_id: report.package_policy_id,
            policy_id: report.policy_id,
            status,
            benchmark: None,
            created: 0,
            deleted: report.deleted,
            failed_deletions: report.failed_deletions,
            error: None,
        }
    }

    fn failed(event: LifecycleEvent, policy: &PackagePolicy, error: &SyncError) -> Self {
        Self {
            event,
            package_policy_id: policy.id.clone(),
            policy_id: policy.policy_id.clone(),
            status: HookStatus::Failed,
            benchmark: None,
            created: 0,
            deleted: 0,
            failed_deletions: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Regenerate rules for a newly created package policy
pub async fn on_package_policy_create(sync: &RuleSync, policy: PackagePolicy) -> HookOutcome {
    reconcile_for(sync, LifecycleEvent::Created, policy).await
}

/// Regenerate rules for an upgraded package policy, keeping user overrides
pub async fn on_package_policy_upgrade(sync: &RuleSync, policy: PackagePolicy) -> HookOutcome {
    reconcile_for(sync, LifecycleEvent::Upgraded, policy).await
}

async fn reconcile_for(sync: &RuleSync, event: LifecycleEvent, policy: PackagePolicy) -> HookOutcome {
    match sync.sync_policy(&policy).await {
        Ok(report) => HookOutcome::synced(event, report),
        Err(e) => {
            tracing::error!(
                "Failed to generate rules out of templates for package policy {} ({}): {}",
                policy.id,
                event,
                e
            );
            HookOutcome::failed(event, &policy, &e)
        }
    }
}

/// Delete the rules of a removed package policy
pub async fn on_package_policy_delete(sync: &RuleSync, policy: PackagePolicy) -> HookOutcome {
    match sync.remove_policy_rules(&policy).await {
        Ok(report) => HookOutcome::removed(report),
        Err(e) => {
            tracing::error!(
                "Failed to delete rules after delete package policy {}: {}",
                policy.id,
                e
            );
            HookOutcome::failed(LifecycleEvent::Deleted, &policy, &e)
        }
    }
}

/// The callbacks a host wires to its lifecycle events
#[derive(Clone)]
pub struct LifecycleHooks {
    pub on_create: PolicyCallback,
    pub on_upgrade: PolicyCallback,
    pub on_delete: PolicyCallback,
}

/// Build the rule sync callbacks around a shared service
pub fn rule_sync_hooks(sync: Arc<RuleSync>) -> LifecycleHooks {
    let on_create: PolicyCallback = {
        let sync = sync.clone();
        Arc::new(move |policy: PackagePolicy| {
            let sync = sync.clone();
            async move { on_package_policy_create(&sync, policy).await }.boxed()
        })
    };
    let on_upgrade: PolicyCallback = {
        let sync = sync.clone();
        Arc::new(move |policy: PackagePolicy| {
            let sync = sync.clone();
            async move { on_package_policy_upgrade(&sync, policy).await }.boxed()
        })
    };
    let on_delete: PolicyCallback = Arc::new(move |policy: PackagePolicy| {
        let sync = sync.clone();
        async move { on_package_policy_delete(&sync, policy).await }.boxed()
    });

    LifecycleHooks {
        on_create,
        on_upgrade,
        on_delete,
    }
}

/// Registration point for lifecycle callbacks
#[derive(Clone, Default)]
pub struct LifecycleRegistry {
    callbacks: HashMap<LifecycleEvent, Vec<PolicyCallback>>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, event: LifecycleEvent, callback: PolicyCallback) {
        self.callbacks.entry(event).or_default().push(callback);
    }

    pub fn register_hooks(&mut self, hooks: LifecycleHooks) {
        self.register(LifecycleEvent::Created, hooks.on_create);
        self.register(LifecycleEvent::Upgraded, hooks.on_upgrade);
        self.register(LifecycleEvent::Deleted, hooks.on_delete);
    }

    /// Number of callbacks registered for `event`
    pub fn registered(&self, event: LifecycleEvent) -> usize {
        self.callbacks.get(&event).map_or(0, Vec::len)
    }

    /// Run the callbacks of `event` in registration order
    pub async fn dispatch(&self, event: LifecycleEvent, policy: PackagePolicy) -> Vec<HookOutcome> {
        let Some(callbacks) = self.callbacks.get(&event) else {
            tracing::debug!("No callbacks registered for {} events", event);
            return Vec::new();
        };

        let mut outcomes = Vec::with_capacity(callbacks.len());
        for callback in callbacks {
            outcomes.push(callback(policy.clone()).await);
        }
        outcomes
    }
}
