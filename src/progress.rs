//! Per-domain progress bar using indicatif

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress over the domains of one run; a no-op when disabled
pub struct ProgressIndicator {
    bar: Option<ProgressBar>,
}

impl ProgressIndicator {
    pub fn new(enabled: bool, total_domains: usize) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total_domains as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar: Some(bar) }
    }

    pub fn disabled() -> Self {
        Self { bar: None }
    }

    /// Mark one domain as finished
    pub fn domain_done(&self, domain: &str, found: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("{} ({} results)", domain, found));
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_indicator_disabled() {
        let progress = ProgressIndicator::disabled();
        assert!(progress.bar.is_none());

        // Should not panic
        progress.domain_done("example.com", 3);
        progress.finish();
    }

    #[test]
    fn test_progress_indicator_enabled() {
        let progress = ProgressIndicator::new(true, 2);
        progress.domain_done("example.com", 3);
        assert_eq!(progress.bar.as_ref().map(|b| b.position()), Some(1));
    }
}
