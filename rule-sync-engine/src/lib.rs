//! Rule reconciliation engine
//!
//! Regenerates the rule instances of a package policy from the rule
//! templates of its benchmark, preserving per-rule `enabled` overrides,
//! and replaces the previous rule set create-then-delete.

pub mod config;
pub mod error;
pub mod hooks;
pub mod index;
pub mod lock;
pub mod paging;
pub mod reconciler;
pub mod report;
pub mod resolver;
pub mod service;
pub mod templates;

pub use config::SyncConfig;
pub use error::SyncError;
pub use hooks::{
    rule_sync_hooks, HookOutcome, HookStatus, LifecycleHooks, LifecycleRegistry, PolicyCallback,
};
pub use index::{load_existing, ExistingRules};
pub use lock::PolicyLocks;
pub use paging::fetch_all;
pub use reconciler::{commit, reconcile, CommitReport};
pub use report::{CleanupFailure, RemovalReport, SyncReport};
pub use resolver::{default_benchmark, resolve_benchmark};
pub use service::RuleSync;
pub use templates::{load_templates, select_templates};
