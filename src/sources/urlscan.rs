// src/sources/urlscan.rs
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use super::{endpoint, SourceAdapter, SourceClient};
use crate::types::{Source, SourceResult};

const URLSCAN_URL: &str = "https://urlscan.io";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    task: Option<Task>,
}

#[derive(Debug, Deserialize)]
struct Task {
    #[serde(default)]
    domain: Option<String>,
}

/// urlscan.io public scan search
pub struct UrlScanSource {
    client: SourceClient,
    base_url: String,
}

impl UrlScanSource {
    pub fn new(client: SourceClient) -> Self {
        Self::with_base_url(client, URLSCAN_URL)
    }

    pub fn with_base_url(client: SourceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

pub fn parse_search(body: &str) -> Result<SourceResult> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let mut result = SourceResult::default();

    let domains = response
        .results
        .iter()
        .filter_map(|r| r.task.as_ref())
        .filter_map(|t| t.domain.as_deref());

    for domain in domains {
        result.push_host(domain);
    }

    Ok(result)
}

#[async_trait]
impl SourceAdapter for UrlScanSource {
    fn source(&self) -> Source {
        Source::WebArchiveScan
    }

    async fn fetch(&self, domain: &str) -> Result<SourceResult> {
        let url = endpoint(&self.base_url, &["api", "v1", "search", ""], &[("q", domain)])?;
        let body = self.client.get_text(url.as_str()).await?;
        parse_search(&body)
    }
}
