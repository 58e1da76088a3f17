// src/sources/mod.rs
//! Passive subdomain sources
//!
//! Each adapter performs one request for one domain against a fixed
//! provider endpoint and extracts hostnames from the provider's payload.
//! Adapters return errors; turning a failure into an empty result is the
//! coordinator's job.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::SourcesConfig;
use crate::types::{Source, SourceResult};

pub mod anubis;
pub mod client;
pub mod crtsh;
pub mod hackertarget;
pub mod otx;
pub mod rapiddns;
pub mod urlscan;

pub use anubis::AnubisSource;
pub use client::{endpoint, SourceClient};
pub use crtsh::CrtShSource;
pub use hackertarget::HackerTargetSource;
pub use otx::OtxSource;
pub use rapiddns::RapidDnsSource;
pub use urlscan::UrlScanSource;

/// A passive data provider queried for one domain at a time
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which provider this adapter talks to
    fn source(&self) -> Source;

    /// Fetch and extract hostnames for `domain`
    async fn fetch(&self, domain: &str) -> Result<SourceResult>;
}

/// Build one adapter per enabled source, in config order.
/// Duplicate entries in the config are collapsed.
pub fn build_sources(config: &SourcesConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let client = SourceClient::new(config)?;
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    let mut seen = Vec::new();

    for source in &config.enabled {
        if seen.contains(source) {
            continue;
        }
        seen.push(*source);
        adapters.push(adapter_for(*source, client.clone()));
    }

    Ok(adapters)
}

fn adapter_for(source: Source, client: SourceClient) -> Arc<dyn SourceAdapter> {
    match source {
        Source::CertificateTransparency => Arc::new(CrtShSource::new(client)),
        Source::PassiveDnsA => Arc::new(OtxSource::new(client)),
        Source::PassiveDnsB => Arc::new(AnubisSource::new(client)),
        Source::HostSearch => Arc::new(HackerTargetSource::new(client)),
        Source::WebArchiveScan => Arc::new(UrlScanSource::new(client)),
        Source::DnsTable => Arc::new(RapidDnsSource::new(client)),
    }
}
