// src/sources/client.rs
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::SourcesConfig;

/// Provider URL under `base_url` with `segments` appended to the path and
/// `query` appended as form-encoded pairs. Both are percent-encoded, so a
/// domain can never change the shape of the request.
pub fn endpoint(base_url: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
    let mut url =
        Url::parse(base_url).with_context(|| format!("Invalid base URL {}", base_url))?;

    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Base URL {} cannot take a path", base_url))?
        .pop_if_empty()
        .extend(segments);

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}

/// HTTP client shared by every source adapter
#[derive(Clone)]
pub struct SourceClient {
    http_client: reqwest::Client,
}

impl SourceClient {
    /// Build a client from the sources section of the config
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(15))
            .gzip(true);

        // Whole-request deadline; the coordinator enforces its own on top
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { http_client })
    }

    /// GET `url` and return the body, failing on non-2xx status
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited by {}", url);
                anyhow::bail!("Rate limited (429)");
            }

            anyhow::bail!("Request to {} failed with status {}", url, status);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }

    /// GET `url` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse JSON from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoint_encodes_query_values() {
        let url = endpoint(
            "https://crt.sh",
            &[],
            &[("q", "example.com&output=html"), ("output", "json")],
        )
        .unwrap();

        assert_eq!(url.as_str(), "https://crt.sh/?q=example.com%26output%3Dhtml&output=json");
    }

    #[test]
    fn test_endpoint_encodes_path_segments() {
        let url = endpoint("https://jldc.me", &["anubis", "subdomains", "a/b?c"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://jldc.me/anubis/subdomains/a%2Fb%3Fc");
    }

    #[test]
    fn test_endpoint_keeps_trailing_slash_segment() {
        let url = endpoint("http://127.0.0.1:8080/", &["hostsearch", ""], &[("q", "example.com")])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/hostsearch/?q=example.com");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(endpoint("not a url", &[], &[]).is_err());
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string("world"))
            .mount(&mock_server)
            .await;

        let client = SourceClient::new(&SourcesConfig::default()).unwrap();
        let body = client
            .get_text(&format!("{}/hello", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(body, "world");
    }

    #[tokio::test]
    async fn test_get_text_non_success_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = SourceClient::new(&SourcesConfig::default()).unwrap();
        let result = client.get_text(&mock_server.uri()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_json_malformed_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;

        let client = SourceClient::new(&SourcesConfig::default()).unwrap();
        let result: Result<Vec<String>> = client.get_json(&mock_server.uri()).await;

        assert!(result.is_err());
    }
}
