// src/sources/otx.rs
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use super::{endpoint, SourceAdapter, SourceClient};
use crate::types::{Source, SourceResult};

const OTX_URL: &str = "https://otx.alienvault.com";

#[derive(Debug, Deserialize)]
struct OtxResponse {
    #[serde(default)]
    passive_dns: Vec<OtxRecord>,
}

#[derive(Debug, Deserialize)]
struct OtxRecord {
    #[serde(default)]
    hostname: Option<String>,
}

/// AlienVault OTX passive DNS
pub struct OtxSource {
    client: SourceClient,
    base_url: String,
}

impl OtxSource {
    pub fn new(client: SourceClient) -> Self {
        Self::with_base_url(client, OTX_URL)
    }

    pub fn with_base_url(client: SourceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

pub fn parse_passive_dns(body: &str) -> Result<SourceResult> {
    let response: OtxResponse = serde_json::from_str(body)?;
    let mut result = SourceResult::default();

    for hostname in response.passive_dns.iter().filter_map(|r| r.hostname.as_deref()) {
        result.push_host(hostname);
    }

    Ok(result)
}

#[async_trait]
impl SourceAdapter for OtxSource {
    fn source(&self) -> Source {
        Source::PassiveDnsA
    }

    async fn fetch(&self, domain: &str) -> Result<SourceResult> {
        let url = endpoint(
            &self.base_url,
            &["api", "v1", "indicators", "domain", domain, "passive_dns"],
            &[],
        )?;
        let body = self.client.get_text(url.as_str()).await?;
        parse_passive_dns(&body)
    }
}
