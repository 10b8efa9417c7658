//! Core domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::CoreError;

/// Identifier selecting which family of rule templates applies to a policy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkId(String);

impl BenchmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BenchmarkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BenchmarkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One configured capability slot on a package policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInput {
    /// Input type of the form `<family>/<benchmark_id>`
    #[serde(rename = "type", default)]
    pub input_type: String,
    #[serde(default)]
    pub enabled: bool,
}

impl PolicyInput {
    pub fn new(input_type: impl Into<String>, enabled: bool) -> Self {
        Self {
            input_type: input_type.into(),
            enabled,
        }
    }
}

/// A deployed package policy, owned by the host framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePolicy {
    /// Package policy identifier
    pub id: String,
    /// The agent policy this package policy belongs to
    pub policy_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<PolicyInput>,
}

impl PackagePolicy {
    pub fn new(id: impl Into<String>, policy_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            policy_id: policy_id.into(),
            name: None,
            inputs: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<PolicyInput>) -> Self {
        self.inputs = inputs;
        self
    }
}

/// Benchmark a rule belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkInfo {
    pub id: BenchmarkId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Rule metadata shared by templates and generated instances.
///
/// Fields other than the ones modelled here are kept in `extra` and copied
/// verbatim into every instance generated from the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMetadata {
    /// Stable rule identifier, unique within a benchmark
    pub rego_rule_id: String,
    #[serde(default)]
    pub name: String,
    pub benchmark: BenchmarkInfo,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RuleMetadata {
    pub fn new(rego_rule_id: impl Into<String>, benchmark: BenchmarkId) -> Self {
        let rego_rule_id = rego_rule_id.into();
        Self {
            name: rego_rule_id.clone(),
            rego_rule_id,
            benchmark: BenchmarkInfo {
                id: benchmark,
                name: None,
                version: None,
            },
            extra: serde_json::Map::new(),
        }
    }
}

/// An immutable, versioned definition of an evaluable check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTemplate {
    pub id: Uuid,
    #[serde(default = "default_template_version")]
    pub version: u32,
    /// Default enabled state for generated rules
    pub enabled: bool,
    pub metadata: RuleMetadata,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_template_version() -> u32 {
    1
}

impl RuleTemplate {
    pub fn new(metadata: RuleMetadata, enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 1,
            enabled,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Create the next version of this template with new metadata
    pub fn new_version(&self, metadata: RuleMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: self.version + 1,
            enabled: self.enabled,
            metadata,
            created_at: Utc::now(),
        }
    }

    pub fn rego_rule_id(&self) -> &str {
        &self.metadata.rego_rule_id
    }

    pub fn benchmark_id(&self) -> &BenchmarkId {
        &self.metadata.benchmark.id
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.metadata.rego_rule_id.trim().is_empty() {
            return Err(CoreError::InvalidRuleTemplate(format!(
                "template {} has an empty rego_rule_id",
                self.id
            )));
        }
        if self.metadata.benchmark.id.as_str().trim().is_empty() {
            return Err(CoreError::InvalidRuleTemplate(format!(
                "template {} has an empty benchmark id",
                self.id
            )));
        }
        Ok(())
    }
}

/// A rule instance that has been planned but not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRuleInstance {
    pub metadata: RuleMetadata,
    pub enabled: bool,
    pub package_policy_id: String,
    pub policy_id: String,
    pub template_id: Uuid,
    pub template_version: u32,
}

impl NewRuleInstance {
    /// Bind a template's content to a package policy
    pub fn from_template(template: &RuleTemplate, policy: &PackagePolicy, enabled: bool) -> Self {
        Self {
            metadata: template.metadata.clone(),
            enabled,
            package_policy_id: policy.id.clone(),
            policy_id: policy.policy_id.clone(),
            template_id: template.id,
            template_version: template.version,
        }
    }

    pub fn rego_rule_id(&self) -> &str {
        &self.metadata.rego_rule_id
    }
}

/// A generated rule bound to exactly one package policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInstance {
    /// Store-assigned identifier
    pub id: Uuid,
    pub metadata: RuleMetadata,
    /// The only field users are expected to change after generation
    pub enabled: bool,
    pub package_policy_id: String,
    pub policy_id: String,
    pub template_id: Uuid,
    pub template_version: u32,
    pub created_at: DateTime<Utc>,
}

impl RuleInstance {
    /// Materialize a planned instance with a fresh identifier
    pub fn from_new(new: NewRuleInstance) -> Self {
        Self {
            id: Uuid::new_v4(),
            metadata: new.metadata,
            enabled: new.enabled,
            package_policy_id: new.package_policy_id,
            policy_id: new.policy_id,
            template_id: new.template_id,
            template_version: new.template_version,
            created_at: Utc::now(),
        }
    }

    pub fn rego_rule_id(&self) -> &str {
        &self.metadata.rego_rule_id
    }
}

/// Package policy lifecycle events the host framework emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Created,
    Upgraded,
    Deleted,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::Created => "created",
            LifecycleEvent::Upgraded => "upgraded",
            LifecycleEvent::Deleted => "deleted",
        };
        f.write_str(name)
    }
}
