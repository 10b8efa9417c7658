//! Index of the rules currently persisted for a package policy

use rule_sync_core::RuleInstance;
use rule_sync_storage::{RuleFilter, RuleInstanceStorage};
use std::collections::HashMap;
use uuid::Uuid;

use crate::paging::fetch_all;
use crate::SyncError;

/// Existing rules keyed by `rego_rule_id`, plus the full list they came from.
///
/// When two rules share a key the later one wins the lookup, but both stay in
/// the full list so cleanup removes them both.
#[derive(Debug, Clone, Default)]
pub struct ExistingRules {
    by_rule_id: HashMap<String, RuleInstance>,
    all: Vec<RuleInstance>,
}

impl ExistingRules {
    pub fn from_rules(rules: Vec<RuleInstance>) -> Self {
        let mut by_rule_id = HashMap::with_capacity(rules.len());
        for rule in &rules {
            if let Some(previous) = by_rule_id.insert(rule.rego_rule_id().to_string(), rule.clone()) {
                tracing::warn!(
                    "Duplicate rule {} for package policy {} (ids {} and {}), keeping the latter",
                    rule.rego_rule_id(),
                    rule.package_policy_id,
                    previous.id,
                    rule.id
                );
            }
        }
        Self { by_rule_id, all: rules }
    }

    pub fn get(&self, rego_rule_id: &str) -> Option<&RuleInstance> {
        self.by_rule_id.get(rego_rule_id)
    }

    /// Every existing rule, including ones shadowed by a duplicate key
    pub fn rules(&self) -> &[RuleInstance] {
        &self.all
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.all.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Load the rules of a package policy pair
pub async fn load_existing(
    store: &dyn RuleInstanceStorage,
    policy_id: &str,
    package_policy_id: &str,
    per_page: u32,
) -> Result<ExistingRules, SyncError> {
    let filter = RuleFilter::by_package_policy(package_policy_id, policy_id);
    let rules = fetch_all(per_page, |page| store.find(&filter, page))
        .await
        .map_err(|source| SyncError::ExistingFetch {
            package_policy_id: package_policy_id.to_string(),
            source,
        })?;
    Ok(ExistingRules::from_rules(rules))
}
