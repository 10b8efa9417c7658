//! In-memory storage implementation for development and testing

use async_trait::async_trait;
use rule_sync_core::{NewRuleInstance, RuleInstance, RuleTemplate};
use std::sync::RwLock;
use uuid::Uuid;

use crate::{
    BulkCreateResult, Page, PageRequest, RuleFilter, RuleInstanceStorage, RuleTemplateStorage,
    StorageError,
};

/// In-memory storage for development and testing.
///
/// Documents are kept in insertion order so paged reads are stable.
pub struct InMemoryStorage {
    rule_templates: RwLock<Vec<RuleTemplate>>,
    rules: RwLock<Vec<RuleInstance>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            rule_templates: RwLock::new(Vec::new()),
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored rule instances, regardless of owner
    pub fn rule_count(&self) -> usize {
        self.rules.read().unwrap().len()
    }

    /// Insert an already-materialized rule instance as-is
    pub fn insert_rule(&self, rule: RuleInstance) {
        self.rules.write().unwrap().push(rule);
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleTemplateStorage for InMemoryStorage {
    async fn save(&self, template: RuleTemplate) -> Result<RuleTemplate, StorageError> {
        let mut templates = self.rule_templates.write().unwrap();
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        Ok(template)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<RuleTemplate>, StorageError> {
        let templates = self.rule_templates.read().unwrap();
        Ok(Page::from_matches(templates.clone(), page))
    }
}

#[async_trait]
impl RuleInstanceStorage for InMemoryStorage {
    async fn find(&self, filter: &RuleFilter, page: PageRequest) -> Result<Page<RuleInstance>, StorageError> {
        let rules = self.rules.read().unwrap();
        let matches: Vec<_> = rules.iter().filter(|r| filter.matches(r)).cloned().collect();
        Ok(Page::from_matches(matches, page))
    }

    async fn bulk_create(&self, new_rules: Vec<NewRuleInstance>) -> Result<BulkCreateResult, StorageError> {
        let mut rules = self.rules.write().unwrap();
        let created = new_rules
            .into_iter()
            .map(|new| {
                let rule = RuleInstance::from_new(new);
                rules.push(rule.clone());
                Ok(rule)
            })
            .collect();
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let mut rules = self.rules.write().unwrap();
        match rules.iter().position(|r| r.id == id) {
            Some(index) => {
                rules.remove(index);
                Ok(())
            }
            None => Err(StorageError::NotFound(format!(
                "Rule with id {} not found",
                id
            ))),
        }
    }

    async fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<RuleInstance, StorageError> {
        let mut rules = self.rules.write().unwrap();
        match rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.enabled = enabled;
                Ok(rule.clone())
            }
            None => Err(StorageError::NotFound(format!(
                "Rule with id {} not found",
                id
            ))),
        }
    }
}
