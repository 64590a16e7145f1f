//! Per-run configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::HarvestError;

/// Knobs for one scrape run.
///
/// Defaults mirror what the CLI ships with: a two second courtesy delay
/// between story fetches and a thirty second request deadline.
#[derive(Debug, Clone)]
pub struct ScrapingConfig {
    /// Pause between story fetches. A deliberate courtesy throttle for the
    /// source server, not a performance knob. Zero disables it.
    pub request_delay: Duration,
    /// Cap on stories scraped per run. Zero yields an empty run, not an error.
    pub max_stories: usize,
    /// Additional attempts after a transient network failure.
    pub retry_count: u32,
    /// Per-request deadline. Must be positive.
    pub timeout: Duration,
    /// Root directory for the persisted collection and downloaded assets.
    pub output_dir: PathBuf,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(2),
            max_stories: 20,
            retry_count: 3,
            timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("data"),
        }
    }
}

impl ScrapingConfig {
    /// Reject configurations the rest of the pipeline cannot honor.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.timeout.is_zero() {
            return Err(HarvestError::Config(
                "timeout must be greater than zero".into(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(HarvestError::Config(
                "output directory must not be empty".into(),
            ));
        }
        Ok(())
    }
}
