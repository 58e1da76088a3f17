// src/monitor.rs
//! One-shot and repeating execution of the aggregation pipeline

use anyhow::Context;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::aggregator::Aggregator;
use crate::coordinator::wait_for_shutdown;
use crate::database::SubdomainStore;
use crate::diff::detect_new;
use crate::domains::DomainInput;
use crate::progress::ProgressIndicator;
use crate::sink::ResultSink;
use crate::stats::RunStats;
use crate::types::RunReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    OneShot,
    Monitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Sleeping,
    Done,
}

/// Where the loop goes after a run completes
pub fn next_state(mode: RunMode, shutdown_requested: bool) -> MonitorState {
    match mode {
        RunMode::Monitor if !shutdown_requested => MonitorState::Sleeping,
        _ => MonitorState::Done,
    }
}

/// Why a run did not complete
#[derive(Debug)]
pub enum RunError {
    /// Missing precondition: unreadable domain list or unavailable store
    Fatal(anyhow::Error),
    /// Results could not be recorded; a later run may retry
    Failed(anyhow::Error),
}

impl RunError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunError::Fatal(_))
    }

    pub fn into_inner(self) -> anyhow::Error {
        match self {
            RunError::Fatal(e) | RunError::Failed(e) => e,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Fatal(e) => write!(f, "fatal: {:#}", e),
            RunError::Failed(e) => write!(f, "run failed: {:#}", e),
        }
    }
}

impl std::error::Error for RunError {}

pub struct Monitor {
    domains: DomainInput,
    aggregator: Aggregator,
    store: Arc<dyn SubdomainStore>,
    sink: ResultSink,
    interval: Duration,
    show_progress: bool,
}

impl Monitor {
    pub fn new(
        domains: DomainInput,
        aggregator: Aggregator,
        store: Arc<dyn SubdomainStore>,
        sink: ResultSink,
        interval: Duration,
    ) -> Self {
        Self {
            domains,
            aggregator,
            store,
            sink,
            interval,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Aggregate, diff against the store, write artifacts, persist, notify.
    pub async fn run_once(
        &self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<RunReport, RunError> {
        let started_at = Utc::now().timestamp();

        let domains = self.domains.load().map_err(RunError::Fatal)?;

        let stats = RunStats::new();

        if domains.is_empty() {
            warn!("No domains to scan, skipping this run");
            return Ok(RunReport {
                started_at,
                domains: 0,
                current: 0,
                wildcards: 0,
                new_subdomains: Vec::new(),
                sources_succeeded: 0,
                sources_failed: 0,
                elapsed: stats.elapsed(),
            });
        }

        let progress = ProgressIndicator::new(self.show_progress, domains.len());

        let aggregate = self
            .aggregator
            .run(&domains, &stats, &progress, shutdown_rx)
            .await;

        let persisted = self
            .store
            .load_all()
            .await
            .with_context(|| format!("Failed to load subdomains from {} store", self.store.name()))
            .map_err(RunError::Fatal)?;

        let new = detect_new(&aggregate.subdomains, &persisted);

        info!(
            "{} current subdomains, {} previously known, {} new",
            aggregate.subdomains.len(),
            persisted.len(),
            new.len()
        );

        // A cut-short run holds a partial set; the previous artifacts stay
        if aggregate.was_cancelled() {
            warn!("Run interrupted by shutdown, leaving results files untouched");
        } else {
            self.sink
                .write_results(&aggregate.subdomains)
                .await
                .map_err(RunError::Failed)?;

            self.sink
                .write_wildcards(&aggregate.wildcards)
                .await
                .map_err(RunError::Failed)?;
        }

        self.store
            .append_new(&new)
            .await
            .context("Failed to persist new subdomains")
            .map_err(RunError::Failed)?;

        self.sink.report_new(&new).await;

        let snapshot = stats.snapshot();
        info!("Run statistics: {}", stats.format_stats());

        Ok(RunReport {
            started_at,
            domains: domains.len(),
            current: aggregate.subdomains.len(),
            wildcards: aggregate.wildcards.len(),
            new_subdomains: new,
            sources_succeeded: snapshot.sources_succeeded,
            sources_failed: snapshot.sources_failed,
            elapsed: stats.elapsed(),
        })
    }

    /// Drive runs until the mode or a shutdown signal says stop
    pub async fn run(
        &self,
        mode: RunMode,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let mut state = MonitorState::Running;

        loop {
            state = match state {
                MonitorState::Running => {
                    match self.run_once(shutdown_rx.clone()).await {
                        Ok(report) => info!("Run complete: {}", report),
                        Err(e) if e.is_fatal() || mode == RunMode::OneShot => {
                            return Err(e.into_inner());
                        }
                        Err(e) => error!("{}; retrying next interval", e),
                    }
                    next_state(mode, *shutdown_rx.borrow())
                }
                MonitorState::Sleeping => {
                    info!(
                        "Sleeping {} before next run",
                        RunStats::format_duration(self.interval.as_secs())
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.interval) => MonitorState::Running,
                        _ = wait_for_shutdown(&mut shutdown_rx) => {
                            info!("Shutdown requested, leaving monitor loop");
                            MonitorState::Done
                        }
                    }
                }
                MonitorState::Done => break,
            };
        }

        Ok(())
    }
}
