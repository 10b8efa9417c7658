//! Filter expressions selecting rule instances

use rule_sync_core::RuleInstance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects the rule instances belonging to a package policy pair, or all of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFilter {
    pub package_policy_id: Option<String>,
    pub policy_id: Option<String>,
}

impl RuleFilter {
    /// Rules generated for exactly this package policy under this owning policy
    pub fn by_package_policy(package_policy_id: impl Into<String>, policy_id: impl Into<String>) -> Self {
        Self {
            package_policy_id: Some(package_policy_id.into()),
            policy_id: Some(policy_id.into()),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, rule: &RuleInstance) -> bool {
        self.package_policy_id
            .as_deref()
            .map_or(true, |id| rule.package_policy_id == id)
            && self.policy_id.as_deref().map_or(true, |id| rule.policy_id == id)
    }

    /// Render as a N1QL predicate over documents bound to `alias`
    pub fn to_n1ql(&self, alias: &str, doc_type: &str) -> String {
        let mut clauses = vec![format!("{}.type = {}", alias, quote_literal(doc_type))];
        if let Some(id) = &self.package_policy_id {
            clauses.push(format!("{}.package_policy_id = {}", alias, quote_literal(id)));
        }
        if let Some(id) = &self.policy_id {
            clauses.push(format!("{}.policy_id = {}", alias, quote_literal(id)));
        }
        clauses.join(" AND ")
    }
}

impl fmt::Display for RuleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.package_policy_id, &self.policy_id) {
            (None, None) => f.write_str("*"),
            (pp, p) => write!(
                f,
                "package_policy_id: {:?} AND policy_id: {:?}",
                pp.as_deref().unwrap_or("*"),
                p.as_deref().unwrap_or("*")
            ),
        }
    }
}

/// Quote a string as a N1QL literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
