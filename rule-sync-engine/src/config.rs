//! Engine configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Page size for every paged store read
    pub page_size: u32,
    /// Serialize reconciliations and removals per owning policy
    pub serialize_per_policy: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            serialize_per_policy: true,
        }
    }
}
