// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Passive data providers queried for subdomains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Certificate Transparency search (crt.sh)
    #[serde(rename = "crtsh")]
    CertificateTransparency,
    /// AlienVault OTX passive DNS
    #[serde(rename = "otx")]
    PassiveDnsA,
    /// Anubis subdomain database (jldc.me)
    #[serde(rename = "anubis")]
    PassiveDnsB,
    /// HackerTarget host search
    #[serde(rename = "hackertarget")]
    HostSearch,
    /// urlscan.io scan archive
    #[serde(rename = "urlscan")]
    WebArchiveScan,
    /// RapidDNS HTML table (opt-in)
    #[serde(rename = "rapiddns")]
    DnsTable,
}

impl Source {
    /// Sources enabled when the config does not name any
    pub const DEFAULT: [Source; 5] = [
        Source::CertificateTransparency,
        Source::PassiveDnsA,
        Source::PassiveDnsB,
        Source::HostSearch,
        Source::WebArchiveScan,
    ];

    /// Short identifier used in config files and logs
    pub fn id(&self) -> &'static str {
        match self {
            Source::CertificateTransparency => "crtsh",
            Source::PassiveDnsA => "otx",
            Source::PassiveDnsB => "anubis",
            Source::HostSearch => "hackertarget",
            Source::WebArchiveScan => "urlscan",
            Source::DnsTable => "rapiddns",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crtsh" | "crt.sh" => Ok(Source::CertificateTransparency),
            "otx" | "alienvault" => Ok(Source::PassiveDnsA),
            "anubis" => Ok(Source::PassiveDnsB),
            "hackertarget" => Ok(Source::HostSearch),
            "urlscan" => Ok(Source::WebArchiveScan),
            "rapiddns" => Ok(Source::DnsTable),
            other => anyhow::bail!("Unknown source '{}'", other),
        }
    }
}

/// Hostnames extracted by one adapter for one domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceResult {
    pub subdomains: Vec<String>,
    /// Entries containing `*`, kept apart from concrete hosts
    pub wildcards: Vec<String>,
}

impl SourceResult {
    pub fn from_subdomains(subdomains: Vec<String>) -> Self {
        Self {
            subdomains,
            wildcards: Vec::new(),
        }
    }

    /// Route a raw hostname to the subdomain or wildcard list.
    /// Blank entries are dropped.
    pub fn push_host(&mut self, raw: &str) {
        let host = raw.trim();
        if host.is_empty() {
            return;
        }
        if host.contains('*') {
            self.wildcards.push(host.to_string());
        } else {
            self.subdomains.push(host.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subdomains.is_empty() && self.wildcards.is_empty()
    }
}

/// How one adapter call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Success { count: usize },
    Failed { reason: String },
    TimedOut,
    Cancelled,
}

impl SourceStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceStatus::Success { .. })
    }
}

/// Outcome of one adapter for one domain
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: Source,
    pub domain: String,
    pub status: SourceStatus,
    pub elapsed: Duration,
}

impl fmt::Display for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SourceStatus::Success { count } => write!(
                f,
                "[+] {} -> {}: {} subdomains in {:?}",
                self.source, self.domain, count, self.elapsed
            ),
            SourceStatus::Failed { reason } => {
                write!(f, "[!] {} -> {}: failed ({})", self.source, self.domain, reason)
            }
            SourceStatus::TimedOut => {
                write!(f, "[!] {} -> {}: timed out", self.source, self.domain)
            }
            SourceStatus::Cancelled => {
                write!(f, "[!] {} -> {}: cancelled", self.source, self.domain)
            }
        }
    }
}

/// Summary of one aggregation run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Unix timestamp of the run start
    pub started_at: i64,
    pub domains: usize,
    pub current: usize,
    pub wildcards: usize,
    /// Newly discovered subdomains, sorted
    pub new_subdomains: Vec<String>,
    pub sources_succeeded: u64,
    pub sources_failed: u64,
    pub elapsed: Duration,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} domains | {} subdomains | {} new | {} wildcards | sources {} ok / {} failed | {:.1}s",
            self.domains,
            self.current,
            self.new_subdomains.len(),
            self.wildcards,
            self.sources_succeeded,
            self.sources_failed,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_host_routes_wildcards() {
        let mut result = SourceResult::default();
        result.push_host("  api.example.com ");
        result.push_host("*.example.com");
        result.push_host("");
        result.push_host("   ");

        assert_eq!(result.subdomains, vec!["api.example.com"]);
        assert_eq!(result.wildcards, vec!["*.example.com"]);
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("crtsh".parse::<Source>().unwrap(), Source::CertificateTransparency);
        assert_eq!("CRT.SH".parse::<Source>().unwrap(), Source::CertificateTransparency);
        assert_eq!("otx".parse::<Source>().unwrap(), Source::PassiveDnsA);
        assert_eq!("rapiddns".parse::<Source>().unwrap(), Source::DnsTable);
        assert!("bing".parse::<Source>().is_err());
    }

    #[test]
    fn test_source_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            sources: Vec<Source>,
        }

        let w: Wrapper = toml::from_str(r#"sources = ["crtsh", "urlscan", "rapiddns"]"#).unwrap();
        assert_eq!(
            w.sources,
            vec![Source::CertificateTransparency, Source::WebArchiveScan, Source::DnsTable]
        );
    }

    #[test]
    fn test_default_sources_exclude_rapiddns() {
        assert_eq!(Source::DEFAULT.len(), 5);
        assert!(!Source::DEFAULT.contains(&Source::DnsTable));
    }

    #[test]
    fn test_source_report_display() {
        let report = SourceReport {
            source: Source::HostSearch,
            domain: "example.com".to_string(),
            status: SourceStatus::Failed {
                reason: "HTTP 500".to_string(),
            },
            elapsed: Duration::from_millis(5),
        };

        let text = report.to_string();
        assert!(text.contains("hackertarget"));
        assert!(text.contains("example.com"));
        assert!(text.contains("HTTP 500"));
    }
}
