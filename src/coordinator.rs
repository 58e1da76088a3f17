// src/coordinator.rs
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::sources::SourceAdapter;
use crate::types::{SourceReport, SourceResult, SourceStatus};

/// Everything the enabled sources returned for one domain
#[derive(Debug, Clone)]
pub struct DomainFetch {
    pub domain: String,
    /// Concatenated adapter output, duplicates included
    pub subdomains: Vec<String>,
    pub wildcards: Vec<String>,
    pub reports: Vec<SourceReport>,
}

impl DomainFetch {
    fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            subdomains: Vec::new(),
            wildcards: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn failed_sources(&self) -> usize {
        self.reports.iter().filter(|r| !r.status.is_success()).count()
    }
}

/// Fetch Coordinator - runs every enabled source for a single domain
pub struct FetchCoordinator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    timeout: Option<Duration>,
}

impl FetchCoordinator {
    pub fn new(sources: Vec<Arc<dyn SourceAdapter>>, timeout: Option<Duration>) -> Self {
        Self { sources, timeout }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Spawn one task per source and wait for all of them.
    ///
    /// A failing, timed-out or cancelled source contributes nothing and
    /// never affects its siblings.
    pub async fn fetch_domain(&self, domain: &str, shutdown_rx: watch::Receiver<bool>) -> DomainFetch {
        let mut handles = Vec::with_capacity(self.sources.len());

        for adapter in &self.sources {
            let adapter = Arc::clone(adapter);
            let domain = domain.to_string();
            let timeout = self.timeout;
            let shutdown_rx = shutdown_rx.clone();

            let source = adapter.source();
            let handle = tokio::spawn(async move {
                run_source(adapter, domain, timeout, shutdown_rx).await
            });

            handles.push((source, handle));
        }

        let mut fetch = DomainFetch::new(domain);

        // Join barrier: every slot is read only after its task finished
        for (source, handle) in handles {
            match handle.await {
                Ok((result, report)) => {
                    fetch.subdomains.extend(result.subdomains);
                    fetch.wildcards.extend(result.wildcards);
                    fetch.reports.push(report);
                }
                Err(e) => {
                    error!("{} task for {} panicked: {}", source, domain, e);
                    fetch.reports.push(SourceReport {
                        source,
                        domain: domain.to_string(),
                        status: SourceStatus::Failed {
                            reason: format!("task failed: {}", e),
                        },
                        elapsed: Duration::ZERO,
                    });
                }
            }
        }

        fetch
    }
}

async fn run_source(
    adapter: Arc<dyn SourceAdapter>,
    domain: String,
    timeout: Option<Duration>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> (SourceResult, SourceReport) {
    let source = adapter.source();
    let started = Instant::now();

    info!("Getting subdomains from {} for {}", source, domain);

    let outcome = tokio::select! {
        outcome = call_with_deadline(adapter.as_ref(), &domain, timeout) => outcome,
        _ = wait_for_shutdown(&mut shutdown_rx) => Outcome::Cancelled,
    };

    let (result, status) = match outcome {
        Outcome::Done(Ok(result)) => {
            let count = result.subdomains.len();
            info!(
                "{}: found {} subdomains ({} wildcards) for {}",
                source,
                count,
                result.wildcards.len(),
                domain
            );
            (result, SourceStatus::Success { count })
        }
        Outcome::Done(Err(e)) => {
            warn!("{}: failed for {}: {:#}", source, domain, e);
            (
                SourceResult::default(),
                SourceStatus::Failed {
                    reason: format!("{:#}", e),
                },
            )
        }
        Outcome::TimedOut => {
            warn!("{}: timed out for {} after {:?}", source, domain, timeout.unwrap_or_default());
            (SourceResult::default(), SourceStatus::TimedOut)
        }
        Outcome::Cancelled => {
            info!("{}: cancelled for {}", source, domain);
            (SourceResult::default(), SourceStatus::Cancelled)
        }
    };

    let report = SourceReport {
        source,
        domain,
        status,
        elapsed: started.elapsed(),
    };

    (result, report)
}

enum Outcome {
    Done(anyhow::Result<SourceResult>),
    TimedOut,
    Cancelled,
}

async fn call_with_deadline(
    adapter: &dyn SourceAdapter,
    domain: &str,
    timeout: Option<Duration>,
) -> Outcome {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, adapter.fetch(domain)).await {
            Ok(result) => Outcome::Done(result),
            Err(_) => Outcome::TimedOut,
        },
        None => Outcome::Done(adapter.fetch(domain).await),
    }
}

/// Resolves once shutdown is signalled. Never resolves if the sender is
/// gone without having signalled.
pub async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct StubSource {
        source: Source,
        hosts: Vec<&'static str>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl StubSource {
        fn ok(source: Source, hosts: Vec<&'static str>) -> Arc<dyn SourceAdapter> {
            Arc::new(Self {
                source,
                hosts,
                fail: false,
                delay: None,
            })
        }

        fn failing(source: Source) -> Arc<dyn SourceAdapter> {
            Arc::new(Self {
                source,
                hosts: vec![],
                fail: true,
                delay: None,
            })
        }

        fn slow(source: Source, delay: Duration) -> Arc<dyn SourceAdapter> {
            Arc::new(Self {
                source,
                hosts: vec!["slow.example.com"],
                fail: false,
                delay: Some(delay),
            })
        }
    }

    #[async_trait]
    impl SourceAdapter for StubSource {
        fn source(&self) -> Source {
            self.source
        }

        async fn fetch(&self, _domain: &str) -> anyhow::Result<SourceResult> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("connection refused");
            }
            let mut result = SourceResult::default();
            for host in &self.hosts {
                result.push_host(host);
            }
            Ok(result)
        }
    }

    // A dropped sender never signals shutdown
    fn no_shutdown() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let coordinator = FetchCoordinator::new(
            vec![
                StubSource::ok(Source::CertificateTransparency, vec!["a.example.com", "b.example.com"]),
                StubSource::ok(Source::PassiveDnsA, vec!["c.example.com"]),
                StubSource::failing(Source::PassiveDnsB),
                StubSource::ok(Source::HostSearch, vec!["d.example.com"]),
                StubSource::ok(Source::WebArchiveScan, vec!["a.example.com", "e.example.com"]),
            ],
            None,
        );

        let fetch = coordinator.fetch_domain("example.com", no_shutdown()).await;

        let got: HashSet<&str> = fetch.subdomains.iter().map(String::as_str).collect();
        let expected: HashSet<&str> =
            ["a.example.com", "b.example.com", "c.example.com", "d.example.com", "e.example.com"]
                .into_iter()
                .collect();

        assert_eq!(got, expected);
        assert_eq!(fetch.reports.len(), 5);
        assert_eq!(fetch.failed_sources(), 1);
    }

    #[tokio::test]
    async fn test_concatenates_without_dedup() {
        let coordinator = FetchCoordinator::new(
            vec![
                StubSource::ok(Source::CertificateTransparency, vec!["a.example.com", "*.example.com"]),
                StubSource::ok(Source::PassiveDnsA, vec!["a.example.com"]),
            ],
            None,
        );

        let fetch = coordinator.fetch_domain("example.com", no_shutdown()).await;

        assert_eq!(fetch.subdomains, vec!["a.example.com", "a.example.com"]);
        assert_eq!(fetch.wildcards, vec!["*.example.com"]);
        let sources: Vec<Source> = fetch.reports.iter().map(|r| r.source).collect();
        assert_eq!(sources, vec![Source::CertificateTransparency, Source::PassiveDnsA]);
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let coordinator = FetchCoordinator::new(
            vec![
                StubSource::slow(Source::CertificateTransparency, Duration::from_secs(10)),
                StubSource::ok(Source::HostSearch, vec!["fast.example.com"]),
            ],
            Some(Duration::from_millis(50)),
        );

        let fetch = coordinator.fetch_domain("example.com", no_shutdown()).await;

        assert_eq!(fetch.subdomains, vec!["fast.example.com"]);
        assert_eq!(fetch.reports[0].status, SourceStatus::TimedOut);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_sources() {
        let (tx, rx) = watch::channel(false);
        let coordinator = FetchCoordinator::new(
            vec![StubSource::slow(Source::CertificateTransparency, Duration::from_secs(30))],
            None,
        );

        let fetch_task = tokio::spawn(async move { coordinator.fetch_domain("example.com", rx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let fetch = fetch_task.await.unwrap();
        assert!(fetch.subdomains.is_empty());
        assert_eq!(fetch.reports[0].status, SourceStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_no_sources_yields_empty_fetch() {
        let coordinator = FetchCoordinator::new(vec![], None);
        let fetch = coordinator.fetch_domain("example.com", no_shutdown()).await;

        assert!(fetch.subdomains.is_empty());
        assert!(fetch.reports.is_empty());
    }
}
