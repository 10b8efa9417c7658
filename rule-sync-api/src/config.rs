//! Startup configuration read from the environment

use anyhow::{bail, Context, Result};
use rule_sync_engine::SyncConfig;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Memory,
    Couchbase,
}

impl FromStr for StorageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageType::Memory),
            "couchbase" => Ok(StorageType::Couchbase),
            other => bail!("unknown STORAGE_TYPE '{}', expected 'memory' or 'couchbase'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CouchbaseSettings {
    pub connection_string: String,
    pub username: String,
    pub password: String,
    pub bucket_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageType,
    pub sync: SyncConfig,
    pub couchbase: CouchbaseSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let defaults = SyncConfig::default();

        let port = var("PORT", "8080")
            .parse::<u16>()
            .context("PORT must be a valid u16")?;
        let storage = var("STORAGE_TYPE", "memory").parse()?;
        let page_size = var("RULE_SYNC_PAGE_SIZE", &defaults.page_size.to_string())
            .parse::<u32>()
            .context("RULE_SYNC_PAGE_SIZE must be a positive integer")?;
        if page_size == 0 {
            bail!("RULE_SYNC_PAGE_SIZE must be a positive integer");
        }
        let serialize_per_policy = var("RULE_SYNC_SERIALIZE", "true")
            .parse::<bool>()
            .context("RULE_SYNC_SERIALIZE must be 'true' or 'false'")?;

        Ok(Self {
            host: var("HOST", "127.0.0.1"),
            port,
            storage,
            sync: SyncConfig {
                page_size,
                serialize_per_policy,
            },
            couchbase: CouchbaseSettings {
                connection_string: var("COUCHBASE_CONNECTION_STRING", "couchbase://localhost"),
                username: var("COUCHBASE_USERNAME", "admin"),
                password: var("COUCHBASE_PASSWORD", "password123"),
                bucket_name: var("COUCHBASE_BUCKET", "rule-sync"),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.storage, StorageType::Memory);
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.couchbase.bucket_name, "rule-sync");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9090"),
            ("STORAGE_TYPE", "Couchbase"),
            ("RULE_SYNC_PAGE_SIZE", "250"),
            ("RULE_SYNC_SERIALIZE", "false"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.storage, StorageType::Couchbase);
        assert_eq!(config.sync.page_size, 250);
        assert!(!config.sync.serialize_per_policy);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("PORT", "http")]).is_err());
        assert!(config(&[("STORAGE_TYPE", "sqlite")]).is_err());
        assert!(config(&[("RULE_SYNC_PAGE_SIZE", "0")]).is_err());
        assert!(config(&[("RULE_SYNC_SERIALIZE", "yes")]).is_err());
    }
}
