// src/database/sqlite.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::SubdomainStore;

/// SQLite-backed store, one row per subdomain
pub struct SqliteStore {
    pool: SqlitePool,
    schema: OnceCell<()>,
}

impl SqliteStore {
    /// Open (or create) the database file behind `database_url`
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Opening SQLite database {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid SQLite URL: {}", database_url))?
            .create_if_missing(true);

        // Single writer
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        Ok(Self {
            pool,
            schema: OnceCell::new(),
        })
    }

    /// Create the table on first use. A table left by older releases has no
    /// uniqueness on `subdomain`; duplicates there are collapsed and a unique
    /// index added so inserts can rely on `ON CONFLICT`.
    async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async {
                let mut tx = self
                    .pool
                    .begin()
                    .await
                    .context("Failed to begin schema transaction")?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS subdomains (
                        id INTEGER PRIMARY KEY,
                        subdomain TEXT NOT NULL UNIQUE,
                        first_seen TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                    )
                    "#,
                )
                .execute(&mut *tx)
                .await
                .context("Failed to create subdomains table")?;

                let removed = sqlx::query(
                    r#"
                    DELETE FROM subdomains
                    WHERE subdomain IS NULL
                       OR id NOT IN (SELECT MIN(id) FROM subdomains GROUP BY subdomain)
                    "#,
                )
                .execute(&mut *tx)
                .await
                .context("Failed to remove duplicate subdomains")?
                .rows_affected();

                if removed > 0 {
                    warn!("Removed {} duplicate or empty rows from subdomains", removed);
                }

                sqlx::query(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_subdomains_subdomain ON subdomains (subdomain)",
                )
                .execute(&mut *tx)
                .await
                .context("Failed to create subdomain index")?;

                tx.commit().await.context("Failed to commit schema")?;

                debug!("SQLite schema ready");
                Ok::<(), anyhow::Error>(())
            })
            .await?;

        Ok(())
    }
}

#[async_trait]
impl SubdomainStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load_all(&self) -> Result<HashSet<String>> {
        self.ensure_schema().await?;

        let rows = sqlx::query("SELECT subdomain FROM subdomains")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load subdomains")?;

        let known: HashSet<String> = rows
            .into_iter()
            .filter_map(|row| row.get::<Option<String>, _>("subdomain"))
            .collect();

        debug!("Loaded {} known subdomains", known.len());

        Ok(known)
    }

    async fn append_new(&self, batch: &[String]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.ensure_schema().await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        for subdomain in batch {
            sqlx::query(
                "INSERT INTO subdomains (subdomain) VALUES (?) ON CONFLICT(subdomain) DO NOTHING",
            )
            .bind(subdomain)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert {}", subdomain))?;
        }

        tx.commit().await.context("Failed to commit subdomains")?;

        debug!("Persisted {} subdomains", batch.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_store(dir: &TempDir) -> SqliteStore {
        let url = format!("sqlite://{}", dir.path().join("subdomains.db").display());
        SqliteStore::connect(&url).await.unwrap()
    }

    fn batch(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fresh_database_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir).await;

        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_then_load() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir).await;

        store
            .append_new(&batch(&["a.example.com", "b.example.com"]))
            .await
            .unwrap();

        let known = store.load_all().await.unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.contains("a.example.com"));
        assert!(known.contains("b.example.com"));
    }

    #[tokio::test]
    async fn test_duplicates_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir).await;

        store.append_new(&batch(&["a.example.com"])).await.unwrap();
        store
            .append_new(&batch(&["a.example.com", "a.example.com", "c.example.com"]))
            .await
            .unwrap();

        assert_eq!(store.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir).await;

        store.append_new(&[]).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();

        let store = temp_store(&dir).await;
        store.append_new(&batch(&["a.example.com"])).await.unwrap();
        store.pool.close().await;

        let reopened = temp_store(&dir).await;
        let known = reopened.load_all().await.unwrap();
        assert!(known.contains("a.example.com"));
    }

    #[tokio::test]
    async fn test_legacy_table_without_unique_constraint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subdomains.db");

        // Layout written by older releases: no UNIQUE, duplicates present
        let legacy = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true),
            )
            .await
            .unwrap();
        sqlx::query("CREATE TABLE subdomains (id INTEGER PRIMARY KEY, subdomain TEXT)")
            .execute(&legacy)
            .await
            .unwrap();
        for name in ["b.example.com", "b.example.com"] {
            sqlx::query("INSERT INTO subdomains (subdomain) VALUES (?)")
                .bind(name)
                .execute(&legacy)
                .await
                .unwrap();
        }
        legacy.close().await;

        let store = temp_store(&dir).await;
        assert_eq!(
            store.load_all().await.unwrap(),
            HashSet::from(["b.example.com".to_string()])
        );

        store
            .append_new(&batch(&["a.example.com", "b.example.com"]))
            .await
            .unwrap();

        let known = store.load_all().await.unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.contains("a.example.com"));

        let rows: i64 = sqlx::query("SELECT COUNT(*) AS n FROM subdomains")
            .fetch_one(&store.pool)
            .await
            .unwrap()
            .get("n");
        assert_eq!(rows, 2);
    }
}
