//! Target domain input

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Where the target domains come from: a list file, a single domain, or both
#[derive(Debug, Clone, Default)]
pub struct DomainInput {
    pub list: Option<PathBuf>,
    pub single: Option<String>,
}

impl DomainInput {
    pub fn new(list: Option<PathBuf>, single: Option<String>) -> Self {
        Self { list, single }
    }

    /// Read the domain list again; called at the start of every run so
    /// edits between monitor passes are picked up. A list that is readable
    /// but empty yields no domains rather than an error.
    pub fn load(&self) -> anyhow::Result<Vec<String>> {
        let single = self.single.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if self.list.is_none() && single.is_none() {
            anyhow::bail!("No target domains given");
        }

        let mut domains = match self.list {
            Some(ref path) => read_domain_list(path)?,
            None => Vec::new(),
        };

        if let Some(single) = single {
            if !domains.iter().any(|d| d == single) {
                domains.push(single.to_string());
            }
        }

        if domains.is_empty() {
            warn!("Domain list is empty");
        }

        Ok(domains)
    }
}

/// One domain per line. Every non-blank line is taken literally after
/// trimming surrounding whitespace.
pub fn read_domain_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read domain list {}", path.display()))?;

    Ok(parse_domain_list(&content))
}

pub fn parse_domain_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
