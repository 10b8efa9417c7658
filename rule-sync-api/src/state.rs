//! Application state shared across handlers

use rule_sync_engine::{rule_sync_hooks, LifecycleRegistry, RuleSync, SyncConfig};
use rule_sync_storage::{InMemoryStorage, RuleInstanceStorage, RuleTemplateStorage, Storage};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub template_storage: Arc<dyn RuleTemplateStorage>,
    pub rule_storage: Arc<dyn RuleInstanceStorage>,
    pub rule_sync: Arc<RuleSync>,
    /// Lifecycle callbacks, with the rule sync hooks registered
    pub registry: LifecycleRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(InMemoryStorage::new()), SyncConfig::default())
    }

    /// Create with a custom storage backend
    pub fn with_storage<S: Storage + 'static>(storage: Arc<S>, config: SyncConfig) -> Self {
        let rule_sync = Arc::new(RuleSync::with_storage(storage.clone(), config));

        let mut registry = LifecycleRegistry::new();
        registry.register_hooks(rule_sync_hooks(rule_sync.clone()));

        Self {
            template_storage: storage.clone(),
            rule_storage: storage,
            rule_sync,
            registry,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.rule_sync.config().page_size
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
