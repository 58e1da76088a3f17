// src/sources/crtsh.rs
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use super::{endpoint, SourceAdapter, SourceClient};
use crate::types::{Source, SourceResult};

const CRTSH_URL: &str = "https://crt.sh";

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    #[serde(default)]
    name_value: Option<String>,
}

/// Certificate Transparency search via crt.sh
pub struct CrtShSource {
    client: SourceClient,
    base_url: String,
}

impl CrtShSource {
    pub fn new(client: SourceClient) -> Self {
        Self::with_base_url(client, CRTSH_URL)
    }

    pub fn with_base_url(client: SourceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// One certificate may list several names in `name_value`, one per line
pub fn parse_entries(body: &str) -> Result<SourceResult> {
    let entries: Vec<CrtShEntry> = serde_json::from_str(body)?;
    let mut result = SourceResult::default();

    for value in entries.iter().filter_map(|e| e.name_value.as_deref()) {
        for name in value.split('\n') {
            result.push_host(name);
        }
    }

    Ok(result)
}

#[async_trait]
impl SourceAdapter for CrtShSource {
    fn source(&self) -> Source {
        Source::CertificateTransparency
    }

    async fn fetch(&self, domain: &str) -> Result<SourceResult> {
        let url = endpoint(&self.base_url, &[], &[("q", domain), ("output", "json")])?;
        let body = self.client.get_text(url.as_str()).await?;
        parse_entries(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourcesConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_splits_multiline_names() {
        let body = r#"[
            {"name_value": "a.example.com\nb.example.com"},
            {"name_value": " c.example.com "},
            {"name_value": "*.example.com\nd.example.com\n"}
        ]"#;

        let result = parse_entries(body).unwrap();

        assert_eq!(
            result.subdomains,
            vec!["a.example.com", "b.example.com", "c.example.com", "d.example.com"]
        );
        assert_eq!(result.wildcards, vec!["*.example.com"]);
    }

    #[test]
    fn test_parse_empty_array() {
        let result = parse_entries("[]").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_missing_name_value() {
        let result = parse_entries(r#"[{"issuer_name": "x"}]"#).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_null_name_value_skipped() {
        let result =
            parse_entries(r#"[{"name_value": null}, {"name_value": "www.example.com"}]"#).unwrap();
        assert_eq!(result.subdomains, vec!["www.example.com"]);
    }

    #[test]
    fn test_parse_html_error_page() {
        assert!(parse_entries("<html>502 Bad Gateway</html>").is_err());
    }

    #[tokio::test]
    async fn test_fetch_from_mock() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "example.com"))
            .and(query_param("output", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"name_value": "www.example.com\n*.dev.example.com"}]"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = SourceClient::new(&SourcesConfig::default()).unwrap();
        let source = CrtShSource::with_base_url(client, mock_server.uri());

        let result = source.fetch("example.com").await.unwrap();

        assert_eq!(result.subdomains, vec!["www.example.com"]);
        assert_eq!(result.wildcards, vec!["*.dev.example.com"]);
    }

    #[tokio::test]
    async fn test_fetch_domain_cannot_alter_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "example.com&output=html"))
            .and(query_param("output", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = SourceClient::new(&SourcesConfig::default()).unwrap();
        let source = CrtShSource::with_base_url(client, mock_server.uri());

        let result = source.fetch("example.com&output=html").await.unwrap();
        assert!(result.is_empty());
    }
}
