// src/sources/anubis.rs
use anyhow::Result;
use async_trait::async_trait;

use super::{endpoint, SourceAdapter, SourceClient};
use crate::types::{Source, SourceResult};

const ANUBIS_URL: &str = "https://jldc.me";

/// Anubis subdomain database served from jldc.me
pub struct AnubisSource {
    client: SourceClient,
    base_url: String,
}

impl AnubisSource {
    pub fn new(client: SourceClient) -> Self {
        Self::with_base_url(client, ANUBIS_URL)
    }

    pub fn with_base_url(client: SourceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// The payload is a bare JSON array of hostnames
pub fn parse_subdomains(body: &str) -> Result<SourceResult> {
    let hosts: Vec<String> = serde_json::from_str(body)?;
    let mut result = SourceResult::default();

    for host in &hosts {
        result.push_host(host);
    }

    Ok(result)
}

#[async_trait]
impl SourceAdapter for AnubisSource {
    fn source(&self) -> Source {
        Source::PassiveDnsB
    }

    async fn fetch(&self, domain: &str) -> Result<SourceResult> {
        let url = endpoint(&self.base_url, &["anubis", "subdomains", domain], &[])?;
        let body = self.client.get_text(url.as_str()).await?;
        parse_subdomains(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourcesConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_array() {
        let result =
            parse_subdomains(r#"["testphp.vulnweb.com", "rest.vulnweb.com"]"#).unwrap();
        assert_eq!(result.subdomains, vec!["testphp.vulnweb.com", "rest.vulnweb.com"]);
    }

    #[test]
    fn test_parse_error_object_fails() {
        assert!(parse_subdomains(r#"{"error": "rate limited"}"#).is_err());
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/anubis/subdomains/vulnweb.com"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = SourceClient::new(&SourcesConfig::default()).unwrap();
        let source = AnubisSource::with_base_url(client, mock_server.uri());

        assert!(source.fetch("vulnweb.com").await.is_err());
    }
}
