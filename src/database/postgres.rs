// src/database/postgres.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::SubdomainStore;

/// PostgreSQL-backed store for shared deployments
pub struct PostgresStore {
    pool: PgPool,
    schema: OnceCell<()>,
}

impl PostgresStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to PostgreSQL database");

        // sqlx 0.8.x doesn't recognize 'channel_binding' parameter from Neon
        let cleaned_url = clean_connection_string(database_url);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&cleaned_url)
            .await
            .context("Failed to connect to PostgreSQL database")?;

        info!("Connected to PostgreSQL successfully");

        Ok(Self {
            pool,
            schema: OnceCell::new(),
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS subdomains (
                        id BIGSERIAL PRIMARY KEY,
                        subdomain TEXT NOT NULL UNIQUE,
                        first_seen TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    )
                    "#,
                )
                .execute(&self.pool)
                .await
                .context("Failed to create subdomains table")?;

                // Tables from older releases lack the constraint ON CONFLICT needs
                sqlx::query(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_subdomains_subdomain ON subdomains (subdomain)",
                )
                .execute(&self.pool)
                .await
                .context("Failed to create subdomain index")?;

                Ok::<(), anyhow::Error>(())
            })
            .await?;

        Ok(())
    }
}

/// Remove connection string parameters sqlx rejects
fn clean_connection_string(url_str: &str) -> String {
    use url::Url;

    let Ok(mut url) = Url::parse(url_str) else {
        return url_str.to_string();
    };

    let unsupported_params = ["channel_binding"];

    let cleaned_pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !unsupported_params.contains(&key.as_ref()))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if cleaned_pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(cleaned_pairs);
    }

    url.to_string()
}

#[async_trait]
impl SubdomainStore for PostgresStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn load_all(&self) -> Result<HashSet<String>> {
        self.ensure_schema().await?;

        let rows = sqlx::query("SELECT subdomain FROM subdomains")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load subdomains")?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.get::<Option<String>, _>("subdomain"))
            .collect())
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
                "INSERT INTO subdomains (subdomain) VALUES ($1) ON CONFLICT (subdomain) DO NOTHING",
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
