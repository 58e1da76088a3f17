// Library interface for sub-scout
pub mod aggregator;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod database;
pub mod diff;
pub mod domains;
pub mod monitor;
pub mod notifier;
pub mod progress;
pub mod sink;
pub mod sources;
pub mod stats;
pub mod types;
