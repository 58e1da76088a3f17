// src/sources/rapiddns.rs
use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{endpoint, SourceAdapter, SourceClient};
use crate::types::{Source, SourceResult};

const RAPIDDNS_URL: &str = "https://rapiddns.io";

/// RapidDNS subdomain listing, scraped from its result table
pub struct RapidDnsSource {
    client: SourceClient,
    base_url: String,
}

impl RapidDnsSource {
    pub fn new(client: SourceClient) -> Self {
        Self::with_base_url(client, RAPIDDNS_URL)
    }

    pub fn with_base_url(client: SourceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid selector {}: {:?}", css, e))
}

/// First cell of every body row of the first table.
/// A page without a table yields an empty result.
pub fn parse_table(body: &str) -> Result<SourceResult> {
    let table_selector = selector("table")?;
    let row_selector = selector("tbody tr")?;
    let cell_selector = selector("td")?;

    let document = Html::parse_document(body);
    let mut result = SourceResult::default();

    let Some(table) = document.select(&table_selector).next() else {
        return Ok(result);
    };

    for row in table.select(&row_selector) {
        if let Some(cell) = row.select(&cell_selector).next() {
            let text: String = cell.text().collect();
            result.push_host(&text);
        }
    }

    Ok(result)
}

#[async_trait]
impl SourceAdapter for RapidDnsSource {
    fn source(&self) -> Source {
        Source::DnsTable
    }

    async fn fetch(&self, domain: &str) -> Result<SourceResult> {
        let url = endpoint(&self.base_url, &["subdomain", domain], &[("full", "1")])?;
        let body = self.client.get_text(url.as_str()).await?;
        parse_table(&body)
    }
}
