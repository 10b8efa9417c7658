//! Couchbase storage implementation
//!
//! Provides persistent storage for rule templates and rule instances using Couchbase.

use async_trait::async_trait;
use couchbase::{
    cluster::Cluster,
    collection::Collection,
    options::{
        cluster_options::ClusterOptions,
        diagnostic_options::WaitUntilReadyOptions,
        kv_options::{GetOptions, RemoveOptions, UpsertOptions},
        query_options::QueryOptions,
    },
};
use tokio_stream::StreamExt;

use couchbase::authenticator::{Authenticator, PasswordAuthenticator};

use rule_sync_core::{
    NewRuleInstance, RuleInstance, RuleTemplate, CSP_RULE_SAVED_OBJECT_TYPE,
    CSP_RULE_TEMPLATE_SAVED_OBJECT_TYPE,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::filter::quote_literal;
use crate::{
    BulkCreateResult, Page, PageRequest, RuleFilter, RuleInstanceStorage, RuleTemplateStorage,
    StorageError,
};

/// Couchbase storage configuration
#[derive(Debug, Clone)]
pub struct CouchbaseConfig {
    pub connection_string: String,
    pub username: String,
    pub password: String,
    pub bucket_name: String,
}

impl Default for CouchbaseConfig {
    fn default() -> Self {
        Self {
            connection_string: "couchbase://localhost".to_string(),
            username: "admin".to_string(),
            password: "password123".to_string(),
            bucket_name: "rule-sync".to_string(),
        }
    }
}

/// Collect query rows, failing on the first row that cannot be read
async fn collect_rows<T, E, S>(mut rows: S) -> Result<Vec<T>, StorageError>
where
    E: std::fmt::Display,
    S: tokio_stream::Stream<Item = Result<T, E>> + Unpin,
{
    let mut collected = Vec::new();
    while let Some(row) = rows.next().await {
        let row = row.map_err(|e| {
            tracing::error!("Failed to read query row: {}", e);
            StorageError::Internal(format!("Failed to read query row: {}", e))
        })?;
        collected.push(row);
    }
    Ok(collected)
}

/// Couchbase storage for rule templates and rule instances
pub struct CouchbaseStorage {
    cluster: Arc<Cluster>,
    collection: Collection,
    bucket_name: String,
}

impl CouchbaseStorage {
    /// Create a new Couchbase storage instance
    pub async fn new(config: CouchbaseConfig) -> Result<Self, StorageError> {
        let authenticator = PasswordAuthenticator::new(&config.username, &config.password);
        let options = ClusterOptions::new(Authenticator::PasswordAuthenticator(authenticator));
        let cluster = Cluster::connect(&config.connection_string, options)
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to connect to cluster: {}", e)))?;

        let bucket = cluster.bucket(&config.bucket_name);
        let _: () = bucket
            .wait_until_ready(WaitUntilReadyOptions::default())
            .await
            .map_err(|e: couchbase::error::Error| {
                StorageError::Connection(format!("Failed to connect to bucket: {}", e))
            })?;

        let collection = bucket.default_collection();

        tracing::info!(
            "Connected to Couchbase cluster at {}, bucket: {}",
            config.connection_string,
            config.bucket_name
        );

        Ok(Self {
            cluster: Arc::new(cluster),
            collection,
            bucket_name: config.bucket_name,
        })
    }

    /// Execute a N1QL query
    async fn query<T: serde::de::DeserializeOwned>(&self, statement: &str) -> Result<Vec<T>, StorageError> {
        let mut result = self
            .cluster
            .query(statement, QueryOptions::default())
            .await
            .map_err(|e: couchbase::error::Error| StorageError::Internal(format!("Query failed: {}", e)))?;

        collect_rows(result.rows::<T>()).await
    }

    async fn count(&self, predicate: &str) -> Result<u64, StorageError> {
        let statement = format!(
            "SELECT RAW COUNT(*) FROM `{}` d WHERE {}",
            self.bucket_name, predicate
        );
        let counts: Vec<u64> = self.query(&statement).await?;
        Ok(counts.into_iter().next().unwrap_or(0))
    }

    async fn find_page<T: serde::de::DeserializeOwned>(
        &self,
        predicate: &str,
        page: PageRequest,
    ) -> Result<Page<T>, StorageError> {
        let total = self.count(predicate).await?;
        let statement = format!(
            r#"
            SELECT d.*
            FROM `{}` d
            WHERE {}
            ORDER BY d.created_at ASC, d.id ASC
            LIMIT {} OFFSET {}
            "#,
            self.bucket_name,
            predicate,
            page.per_page,
            page.offset()
        );
        let items = self.query(&statement).await?;
        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn get_rule(&self, id: Uuid) -> Result<Option<RuleInstance>, StorageError> {
        let doc_id = rule_doc_id(id);

        match self.collection.get(&doc_id, GetOptions::default()).await {
            Ok(result) => {
                let doc: TypedDocument<RuleInstance> = result
                    .content_as::<TypedDocument<RuleInstance>>()
                    .map_err(|e| {
                        StorageError::Serialization(serde_json::Error::io(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            e.to_string(),
                        )))
                    })?;
                Ok(Some(doc.data))
            }
            Err(e) => {
                if e.to_string().contains("DocumentNotFound") {
                    Ok(None)
                } else {
                    Err(StorageError::Internal(format!("Failed to get rule: {}", e)))
                }
            }
        }
    }

    async fn upsert_rule(&self, rule: &RuleInstance) -> Result<(), StorageError> {
        let doc = TypedDocument {
            doc_type: CSP_RULE_SAVED_OBJECT_TYPE.to_string(),
            data: rule.clone(),
        };
        let _ = self
            .collection
            .upsert(&rule_doc_id(rule.id), &doc, UpsertOptions::default())
            .await
            .map_err(|e| StorageError::Internal(format!("Failed to save rule: {}", e)))?;
        Ok(())
    }
}

fn rule_doc_id(id: Uuid) -> String {
    format!("{}::{}", CSP_RULE_SAVED_OBJECT_TYPE, id)
}

/// Wrapper for documents with type field
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct TypedDocument<T> {
    #[serde(rename = "type")]
    doc_type: String,
    #[serde(flatten)]
    data: T,
}

#[async_trait]
impl RuleTemplateStorage for CouchbaseStorage {
    async fn save(&self, template: RuleTemplate) -> Result<RuleTemplate, StorageError> {
        let doc_id = format!("{}::{}", CSP_RULE_TEMPLATE_SAVED_OBJECT_TYPE, template.id);

        let doc = TypedDocument {
            doc_type: CSP_RULE_TEMPLATE_SAVED_OBJECT_TYPE.to_string(),
            data: template.clone(),
        };

        let _ = self
            .collection
            .upsert(&doc_id, &doc, UpsertOptions::default())
            .await
            .map_err(|e| StorageError::Internal(format!("Failed to save rule template: {}", e)))?;

        tracing::debug!(
            "Saved rule template {} version {}",
            template.rego_rule_id(),
            template.version
        );
        Ok(template)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<RuleTemplate>, StorageError> {
        let predicate = format!("d.type = {}", quote_literal(CSP_RULE_TEMPLATE_SAVED_OBJECT_TYPE));
        self.find_page(&predicate, page).await
    }
}

#[async_trait]
impl RuleInstanceStorage for CouchbaseStorage {
    async fn find(&self, filter: &RuleFilter, page: PageRequest) -> Result<Page<RuleInstance>, StorageError> {
        let predicate = filter.to_n1ql("d", CSP_RULE_SAVED_OBJECT_TYPE);
        self.find_page(&predicate, page).await
    }

    async fn bulk_create(&self, rules: Vec<NewRuleInstance>) -> Result<BulkCreateResult, StorageError> {
        let mut created = Vec::with_capacity(rules.len());
        for new in rules {
            let rule = RuleInstance::from_new(new);
            created.push(self.upsert_rule(&rule).await.map(|_| rule));
        }
        tracing::debug!("Bulk created {} rule documents", created.len());
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        match self.collection.remove(&rule_doc_id(id), RemoveOptions::default()).await {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.to_string().contains("DocumentNotFound") {
                    Err(StorageError::NotFound(format!("Rule with id {} not found", id)))
                } else {
                    Err(StorageError::Internal(format!("Failed to delete rule: {}", e)))
                }
            }
        }
    }

    async fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<RuleInstance, StorageError> {
        let mut rule = self
            .get_rule(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Rule with id {} not found", id)))?;
        rule.enabled = enabled;
        self.upsert_rule(&rule).await?;
        Ok(rule)
    }
}
