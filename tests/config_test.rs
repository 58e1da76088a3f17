// Test configuration loading
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use sub_scout::config::{Config, StoreBackend};
use sub_scout::types::Source;
use tempfile::NamedTempFile;

#[test]
fn test_load_example_config() {
    let config_path = Path::new("sub-scout.example.toml");
    let config = Config::from_file(config_path).expect("Failed to load example config");

    assert_eq!(config.sources.enabled, Source::DEFAULT.to_vec());
    assert_eq!(config.sources.timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.sources.max_concurrent_domains, 4);

    assert_eq!(config.database.backend, StoreBackend::Sqlite);
    assert_eq!(config.database.url, "sqlite://subdomains_database.db");

    let webhook = config.webhook.as_ref().expect("webhook section");
    assert!(webhook.url.starts_with("https://discord.com/api/webhooks/"));
    assert_eq!(webhook.secret, None);
    assert_eq!(webhook.max_message_len, 2000);

    assert_eq!(config.output.results_file, "sub-scout-results.txt");
    assert_eq!(config.output.wildcards_file, None);
    assert_eq!(config.monitor.interval(), Duration::from_secs(5 * 3600));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_default_config_uses_defaults() {
    let config = Config::from_file_or_default(Path::new("/nonexistent/sub-scout.toml"))
        .expect("defaults");

    assert_eq!(config.sources.enabled.len(), 5);
    assert!(config.webhook.is_none());
}

#[test]
fn test_missing_explicit_config_is_error() {
    assert!(Config::from_file(Path::new("/nonexistent/sub-scout.toml")).is_err());
}

#[test]
fn test_unknown_source_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[sources]\nenabled = [\"crtsh\", \"bing\"]").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_zero_interval_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[monitor]\ninterval_hours = 0").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}
