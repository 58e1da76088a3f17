// src/config.rs

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::types::Source;

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<Source>,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrent_domains")]
    pub max_concurrent_domains: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_enabled_sources() -> Vec<Source> { Source::DEFAULT.to_vec() }
fn default_source_timeout() -> u64 { 30 }
fn default_max_concurrent_domains() -> usize { 4 }
fn default_user_agent() -> String {
    format!("sub-scout/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
            timeout_secs: default_source_timeout(),
            max_concurrent_domains: default_max_concurrent_domains(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourcesConfig {
    /// Per-adapter deadline; 0 disables it
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Postgres,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_backend() -> StoreBackend { StoreBackend::Sqlite }

fn default_database_url() -> String {
    "sqlite://subdomains_database.db".to_string()
}

fn default_store_path() -> String {
    "subdomains_database.txt".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_database_url(),
            path: default_store_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub secret: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Discord rejects messages longer than 2000 characters
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

fn default_max_message_len() -> usize { 2000 }

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: None,
            timeout_secs: None,
            max_message_len: default_max_message_len(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_results_file")]
    pub results_file: String,
    #[serde(default)]
    pub wildcards_file: Option<String>,
}

fn default_results_file() -> String { "sub-scout-results.txt".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_file: default_results_file(),
            wildcards_file: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

fn default_interval_hours() -> u64 { 5 }

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 3600)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    /// Only used for the implicit default config path.
    pub fn from_file_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sources.enabled.is_empty() {
            anyhow::bail!("sources.enabled must name at least one source");
        }
        if self.sources.max_concurrent_domains == 0 {
            anyhow::bail!("sources.max_concurrent_domains must be greater than 0");
        }
        if self.monitor.interval_hours == 0 {
            anyhow::bail!("monitor.interval_hours must be greater than 0");
        }
        if let Some(ref webhook) = self.webhook {
            if webhook.max_message_len == 0 {
                anyhow::bail!("webhook.max_message_len must be greater than 0");
            }
        }
        Ok(())
    }
}
