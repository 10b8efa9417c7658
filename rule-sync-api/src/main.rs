//! Rule Sync - Main Application Entry Point
//!
//! Keeps the generated posture rules of every package policy in step with
//! the rule templates of its benchmark.

use anyhow::Result;
use rule_sync_api::{config::StorageType, AppConfig, AppState};
use rule_sync_storage::InMemoryStorage;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rule_sync=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting Rule Sync server on {}", config.bind_address());

    let app_state = match config.storage {
        StorageType::Couchbase => couchbase_state(&config).await?,
        StorageType::Memory => {
            tracing::info!("Initializing InMemory storage...");
            AppState::with_storage(Arc::new(InMemoryStorage::new()), config.sync.clone())
        }
    };

    let app = rule_sync_api::create_router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "couchbase")]
async fn couchbase_state(config: &AppConfig) -> Result<AppState> {
    use rule_sync_storage::{CouchbaseConfig, CouchbaseStorage};

    tracing::info!(
        "Initializing Couchbase storage on {} (bucket {})...",
        config.couchbase.connection_string,
        config.couchbase.bucket_name
    );
    let store = CouchbaseStorage::new(CouchbaseConfig {
        connection_string: config.couchbase.connection_string.clone(),
        username: config.couchbase.username.clone(),
        password: config.couchbase.password.clone(),
        bucket_name: config.couchbase.bucket_name.clone(),
    })
    .await?;
    Ok(AppState::with_storage(Arc::new(store), config.sync.clone()))
}

#[cfg(not(feature = "couchbase"))]
async fn couchbase_state(_config: &AppConfig) -> Result<AppState> {
    anyhow::bail!("Couchbase storage requested but 'couchbase' feature not enabled")
}
