// src/sources/hackertarget.rs
use anyhow::Result;
use async_trait::async_trait;

use super::{endpoint, SourceAdapter, SourceClient};
use crate::types::{Source, SourceResult};

const HACKERTARGET_URL: &str = "https://api.hackertarget.com";

/// HackerTarget host search, answers with `host,ip` lines
pub struct HackerTargetSource {
    client: SourceClient,
    base_url: String,
}

impl HackerTargetSource {
    pub fn new(client: SourceClient) -> Self {
        Self::with_base_url(client, HACKERTARGET_URL)
    }

    pub fn with_base_url(client: SourceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Lines without a comma are provider messages ("API count exceeded", ...)
pub fn parse_hostsearch(body: &str) -> SourceResult {
    let mut result = SourceResult::default();

    for line in body.lines() {
        let mut fields = line.split(',');
        if let (Some(host), Some(_)) = (fields.next(), fields.next()) {
            result.push_host(host);
        }
    }

    result
}

#[async_trait]
impl SourceAdapter for HackerTargetSource {
    fn source(&self) -> Source {
        Source::HostSearch
    }

    async fn fetch(&self, domain: &str) -> Result<SourceResult> {
        let url = endpoint(&self.base_url, &["hostsearch", ""], &[("q", domain)])?;
        let body = self.client.get_text(url.as_str()).await?;
        Ok(parse_hostsearch(&body))
    }
}
