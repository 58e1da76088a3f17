// src/sink.rs
//! Results artifact, wildcard artifact and new-subdomain reporting

use anyhow::Context;
use chrono::Utc;
use colored::Colorize;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::notifier::Notifier;

pub struct ResultSink {
    results_path: PathBuf,
    wildcards_path: Option<PathBuf>,
    notifier: Option<(Arc<dyn Notifier>, String)>,
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
}

impl ResultSink {
    /// Sink writing to the configured artifacts and printing to stdout
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            results_path: PathBuf::from(&config.results_file),
            wildcards_path: config.wildcards_file.as_ref().map(PathBuf::from),
            notifier: None,
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Forward new subdomains to `notifier` at `destination`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, destination: String) -> Self {
        self.notifier = Some((notifier, destination));
        self
    }

    /// Print new subdomains to `writer` instead of stdout
    pub fn with_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.writer = Mutex::new(writer);
        self.use_colors = false;
        self
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// Replace the results artifact with `current`, sorted
    pub async fn write_results(&self, current: &HashSet<String>) -> anyhow::Result<()> {
        write_sorted(&self.results_path, current).await?;
        info!(
            "Wrote {} subdomains to {}",
            current.len(),
            self.results_path.display()
        );
        Ok(())
    }

    /// Replace the wildcard artifact, if one is configured
    pub async fn write_wildcards(&self, wildcards: &HashSet<String>) -> anyhow::Result<()> {
        let Some(ref path) = self.wildcards_path else {
            return Ok(());
        };

        write_sorted(path, wildcards).await?;
        debug!("Wrote {} wildcard patterns to {}", wildcards.len(), path.display());
        Ok(())
    }

    /// Print and notify newly discovered subdomains. Notification failures
    /// are logged and swallowed.
    pub async fn report_new(&self, new: &[String]) {
        if new.is_empty() {
            info!("No new subdomains");
            return;
        }

        if let Err(e) = self.print_new(new) {
            warn!("Failed to print new subdomains: {}", e);
        }

        let Some((ref notifier, ref destination)) = self.notifier else {
            return;
        };

        match notifier.notify(destination, new).await {
            Ok(()) => info!("Notified {} new subdomains", new.len()),
            Err(e) => warn!("Notification failed: {:#}", e),
        }
    }

    fn print_new(&self, new: &[String]) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("output writer lock poisoned"))?;

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        for subdomain in new {
            if self.use_colors {
                writeln!(
                    writer,
                    "{} {} {}",
                    format!("[{}]", timestamp).dimmed(),
                    "[new]".green().bold(),
                    subdomain.cyan().bold()
                )?;
            } else {
                writeln!(writer, "[{}] [new] {}", timestamp, subdomain)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

/// Atomically replace `path` with the sorted lines of `items`
async fn write_sorted(path: &Path, items: &HashSet<String>) -> anyhow::Result<()> {
    let mut lines: Vec<&str> = items.iter().map(String::as_str).collect();
    lines.sort_unstable();

    let mut contents = lines.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }

    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, contents)
        .await
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;

    fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
