//! Storage layer for Rule Sync
//!
//! Provides persistence for rule templates and generated rule instances.
//! Supports both in-memory (for development) and Couchbase backends.

pub mod error;
pub mod filter;
pub mod memory;
pub mod page;
pub mod traits;

#[cfg(feature = "couchbase")]
pub mod couchbase;

pub use error::StorageError;
pub use filter::RuleFilter;
pub use memory::InMemoryStorage;
pub use page::{Page, PageRequest};
pub use traits::{BulkCreateResult, RuleInstanceStorage, RuleTemplateStorage};

#[cfg(feature = "couchbase")]
pub use couchbase::{CouchbaseConfig, CouchbaseStorage};

/// Unified storage trait
#[async_trait::async_trait]
pub trait Storage: RuleTemplateStorage + RuleInstanceStorage + Send + Sync {}

#[async_trait::async_trait]
impl<T> Storage for T where T: RuleTemplateStorage + RuleInstanceStorage + Send + Sync {}
