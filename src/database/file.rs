// src/database/file.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::SubdomainStore;

/// Plain text store, one subdomain per line
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn read_lines(&self) -> Result<Vec<String>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            info!("Store file {:?} does not exist, starting fresh", self.path);
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read store file {:?}", self.path))?;

        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

#[async_trait]
impl SubdomainStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load_all(&self) -> Result<HashSet<String>> {
        Ok(self.read_lines().await?.into_iter().collect())
    }

    async fn append_new(&self, batch: &[String]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;

        let mut lines = self.read_lines().await?;
        let mut known: HashSet<String> = lines.iter().cloned().collect();

        for subdomain in batch {
            if known.insert(subdomain.clone()) {
                lines.push(subdomain.clone());
            }
        }

        let mut contents = lines.join("\n");
        contents.push('\n');

        // Write to temporary file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");

        fs::write(&temp_path, contents)
            .await
            .context("Failed to write store to temporary file")?;

        fs::rename(&temp_path, &self.path)
            .await
            .context("Failed to rename temporary store file")?;

        debug!("Store file now holds {} subdomains", lines.len());

        Ok(())
    }
}
