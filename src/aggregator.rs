// src/aggregator.rs
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, error, info, warn};

use crate::coordinator::{DomainFetch, FetchCoordinator};
use crate::progress::ProgressIndicator;
use crate::stats::RunStats;
use crate::types::{SourceReport, SourceStatus};

/// Deduplicated result of one pass over the domain list
#[derive(Debug, Default)]
pub struct Aggregate {
    pub subdomains: HashSet<String>,
    pub wildcards: HashSet<String>,
    pub reports: Vec<SourceReport>,
}

impl Aggregate {
    /// Fold one domain's output in; exact string equality is the key
    pub fn merge(&mut self, fetch: DomainFetch) {
        self.subdomains.extend(fetch.subdomains);
        self.wildcards.extend(fetch.wildcards);
        self.reports.extend(fetch.reports);
    }

    /// True when shutdown cut at least one source call short
    pub fn was_cancelled(&self) -> bool {
        self.reports
            .iter()
            .any(|r| r.status == SourceStatus::Cancelled)
    }
}

/// Runs the fetch coordinator over every domain and merges the results
pub struct Aggregator {
    coordinator: Arc<FetchCoordinator>,
    max_concurrent_domains: usize,
}

impl Aggregator {
    pub fn new(coordinator: FetchCoordinator, max_concurrent_domains: usize) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            max_concurrent_domains: max_concurrent_domains.max(1),
        }
    }

    /// Fetch every domain, at most `max_concurrent_domains` at a time.
    ///
    /// Domain tasks send their batches over a channel; the merged set is
    /// owned by this future alone.
    pub async fn run(
        &self,
        domains: &[String],
        stats: &RunStats,
        progress: &ProgressIndicator,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Aggregate {
        info!(
            "Aggregating {} domains across {} sources",
            domains.len(),
            self.coordinator.source_count()
        );

        let (batch_tx, mut batch_rx) = mpsc::channel::<DomainFetch>(self.max_concurrent_domains);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_domains));
        let mut workers = Vec::with_capacity(domains.len());

        for domain in domains {
            let domain = domain.clone();
            let coordinator = Arc::clone(&self.coordinator);
            let semaphore = Arc::clone(&semaphore);
            let batch_tx = batch_tx.clone();
            let shutdown_rx = shutdown_rx.clone();

            workers.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };

                let fetch = coordinator.fetch_domain(&domain, shutdown_rx).await;

                if batch_tx.send(fetch).await.is_err() {
                    warn!("Result channel closed before {} was merged", domain);
                }
            }));
        }

        // Channel closes once every domain task is done
        drop(batch_tx);

        let mut aggregate = Aggregate::default();

        while let Some(fetch) = batch_rx.recv().await {
            stats.record_fetch(&fetch);
            progress.domain_done(&fetch.domain, fetch.subdomains.len());
            debug!(
                "Merged {} entries for {} ({} sources failed)",
                fetch.subdomains.len(),
                fetch.domain,
                fetch.failed_sources()
            );
            aggregate.merge(fetch);
        }

        for handle in workers {
            if let Err(e) = handle.await {
                error!("Domain task failed: {}", e);
            }
        }

        progress.finish();

        info!(
            "Aggregation complete: {} unique subdomains, {} wildcards",
            aggregate.subdomains.len(),
            aggregate.wildcards.len()
        );

        aggregate
    }
}
