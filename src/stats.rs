//! Per-run statistics for sub-scout

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::coordinator::DomainFetch;

/// Thread-safe statistics for one aggregation run
#[derive(Clone)]
pub struct RunStats {
    domains_done: Arc<AtomicU64>,
    sources_succeeded: Arc<AtomicU64>,
    sources_failed: Arc<AtomicU64>,
    subdomains_collected: Arc<AtomicU64>,
    start_time: Instant,
}

/// Snapshot of statistics at a point in time
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub domains_done: u64,
    pub sources_succeeded: u64,
    pub sources_failed: u64,
    /// Raw count before deduplication
    pub subdomains_collected: u64,
    pub elapsed_secs: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            domains_done: Arc::new(AtomicU64::new(0)),
            sources_succeeded: Arc::new(AtomicU64::new(0)),
            sources_failed: Arc::new(AtomicU64::new(0)),
            subdomains_collected: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Account for one finished domain
    pub fn record_fetch(&self, fetch: &DomainFetch) {
        let failed = fetch.failed_sources() as u64;
        let succeeded = fetch.reports.len() as u64 - failed;

        self.domains_done.fetch_add(1, Ordering::Relaxed);
        self.sources_succeeded.fetch_add(succeeded, Ordering::Relaxed);
        self.sources_failed.fetch_add(failed, Ordering::Relaxed);
        self.subdomains_collected
            .fetch_add(fetch.subdomains.len() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            domains_done: self.domains_done.load(Ordering::Relaxed),
            sources_succeeded: self.sources_succeeded.load(Ordering::Relaxed),
            sources_failed: self.sources_failed.load(Ordering::Relaxed),
            subdomains_collected: self.subdomains_collected.load(Ordering::Relaxed),
            elapsed_secs: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Format statistics as a human-readable string
    pub fn format_stats(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "{} domains | {} sources ok | {} sources failed | {} raw subdomains | elapsed: {}",
            snapshot.domains_done,
            snapshot.sources_succeeded,
            snapshot.sources_failed,
            snapshot.subdomains_collected,
            Self::format_duration(snapshot.elapsed_secs)
        )
    }

    pub fn format_duration(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
