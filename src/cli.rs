// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, WebhookConfig};
use crate::types::Source;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "sub-scout.toml";

/// Sub-Scout: passive subdomain discovery and monitoring
///
/// Collects subdomains for each target from public passive sources, keeps
/// every subdomain ever seen in a store, and reports the ones that are new.
#[derive(Parser, Debug, Clone)]
#[command(name = "sub-scout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// Path to TOML config file [default: sub-scout.toml, optional]
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// File containing target domains (one per line)
    #[arg(short = 'l', long = "domain-list")]
    pub domain_list: Option<String>,

    /// Single target domain
    #[arg(short = 'd', long = "domain")]
    pub domain: Option<String>,

    /// Comma-separated sources to query (crtsh,otx,anubis,hackertarget,urlscan,rapiddns)
    #[arg(long = "sources", value_delimiter = ',')]
    pub sources: Vec<String>,

    // ===== Execution =====
    /// Repeat forever, sleeping monitor.interval_hours between runs
    #[arg(short = 'm', long = "monitor")]
    pub monitor: bool,

    // ===== Output Destination =====
    /// Write the results file here instead of the configured path
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Write wildcard patterns to this file
    #[arg(long = "wildcards")]
    pub wildcards: Option<String>,

    /// Webhook URL for new-subdomain notifications (overrides config)
    #[arg(short = 'w', long = "webhook")]
    pub webhook_url: Option<String>,

    /// Override webhook secret from config
    #[arg(long = "webhook-secret")]
    pub webhook_secret: Option<String>,

    /// Disable webhook notifications even if configured
    #[arg(long = "no-webhook")]
    pub no_webhook: bool,

    // ===== Display =====
    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.domain_list.is_none() && self.domain.is_none() {
            anyhow::bail!(
                "No targets given. Use --domain-list <FILE> and/or --domain <DOMAIN>."
            );
        }

        // Verbose and quiet are mutually exclusive
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if self.no_webhook && self.webhook_url.is_some() {
            anyhow::bail!("Cannot use --webhook together with --no-webhook");
        }

        self.parsed_sources()?;

        Ok(())
    }

    /// Config path to load and whether it was named explicitly
    pub fn config_path(&self) -> (PathBuf, bool) {
        match self.config {
            Some(ref path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }

    /// Sources named with `--sources`; empty means use the config
    pub fn parsed_sources(&self) -> anyhow::Result<Vec<Source>> {
        self.sources
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::parse::<Source>)
            .collect()
    }

    /// Fold command line overrides into the loaded config
    pub fn apply_overrides(&self, config: &mut Config) -> anyhow::Result<()> {
        let sources = self.parsed_sources()?;
        if !sources.is_empty() {
            config.sources.enabled = sources;
        }

        if let Some(ref output) = self.output {
            config.output.results_file = output.clone();
        }

        if let Some(ref wildcards) = self.wildcards {
            config.output.wildcards_file = Some(wildcards.clone());
        }

        if let Some(ref url) = self.webhook_url {
            match config.webhook {
                Some(ref mut webhook) => webhook.url = url.clone(),
                None => config.webhook = Some(WebhookConfig::new(url.clone())),
            }
        }

        if let Some(ref secret) = self.webhook_secret {
            if let Some(ref mut webhook) = config.webhook {
                webhook.secret = Some(secret.clone());
            }
        }

        if self.no_webhook {
            config.webhook = None;
        }

        Ok(())
    }

    /// Check if progress indicator should be enabled
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.quiet && is_terminal::is_terminal(std::io::stderr())
    }

    /// Log level forced by flags, if any
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}
