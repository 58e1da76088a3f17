// src/main.rs
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sub_scout::aggregator::Aggregator;
use sub_scout::cli::Cli;
use sub_scout::config::Config;
use sub_scout::coordinator::FetchCoordinator;
use sub_scout::database::open_store;
use sub_scout::domains::DomainInput;
use sub_scout::monitor::{Monitor, RunMode};
use sub_scout::notifier::WebhookNotifier;
use sub_scout::sink::ResultSink;
use sub_scout::sources::{build_sources, SourceAdapter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // Load config file; only an explicitly named file has to exist
    let (config_path, explicit) = cli.config_path();
    let mut config = if explicit {
        Config::from_file(&config_path)?
    } else {
        Config::from_file_or_default(&config_path)?
    };

    // Apply CLI overrides
    cli.apply_overrides(&mut config)?;
    config.validate()?;

    // Initialize logging
    let log_level = cli.log_level().unwrap_or(config.logging.level.as_str());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting sub-scout...");

    let sources = build_sources(&config.sources)?;
    tracing::info!(
        "Enabled sources: {}",
        sources
            .iter()
            .map(|s| s.source().id())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let coordinator = FetchCoordinator::new(sources, config.sources.timeout());
    let aggregator = Aggregator::new(coordinator, config.sources.max_concurrent_domains);

    let store = open_store(&config.database).await?;

    let mut sink = ResultSink::new(&config.output);
    if let Some(ref webhook) = config.webhook {
        tracing::info!("Webhook notifications enabled");
        sink = sink.with_notifier(Arc::new(WebhookNotifier::new(webhook)), webhook.url.clone());
    }

    let domains = DomainInput::new(cli.domain_list.as_ref().map(PathBuf::from), cli.domain.clone());

    let monitor = Monitor::new(domains, aggregator, store, sink, config.monitor.interval())
        .with_progress(cli.should_show_progress());

    let mode = if cli.monitor {
        tracing::info!(
            "Monitor mode: repeating every {} hours",
            config.monitor.interval_hours
        );
        RunMode::Monitor
    } else {
        RunMode::OneShot
    };

    // Ctrl-C cancels in-flight fetches and ends the monitor loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down...");
            shutdown_tx.send(true).ok();
        }
    });

    monitor.run(mode, shutdown_rx).await?;

    tracing::info!("sub-scout finished");

    Ok(())
}
