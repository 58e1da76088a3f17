// src/database/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseConfig, StoreBackend};

pub mod file;
pub mod postgres;
pub mod sqlite;

pub use file::FileStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Durable set of every subdomain ever recorded.
///
/// The store only grows: nothing is ever updated or removed, and appending
/// an entry that is already present is a no-op.
#[async_trait]
pub trait SubdomainStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Every persisted subdomain; an empty or fresh store yields an empty set
    async fn load_all(&self) -> Result<HashSet<String>>;

    /// Durably add `batch`. The batch lands as a whole or not at all.
    async fn append_new(&self, batch: &[String]) -> Result<()>;
}

/// Open the configured backend. Failure here is fatal to the process.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn SubdomainStore>> {
    let store: Arc<dyn SubdomainStore> = match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::connect(&config.url).await?),
        StoreBackend::Postgres => {
            Arc::new(PostgresStore::connect(&config.url, config.max_connections).await?)
        }
        StoreBackend::File => Arc::new(FileStore::new(PathBuf::from(&config.path))),
    };

    info!("Using {} subdomain store", store.name());

    Ok(store)
}
