//! Command-line interface definitions for khobor.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The CLI is a thin collaborator over the core: it only translates flags
//! into a [`ScrapingConfig`] and picks a source out of the registry.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ScrapingConfig;

/// Command-line arguments for the khobor scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape The Daily Star into ./data
/// khobor daily_star
///
/// # Scrape Prothom Alo, at most 5 stories, gentle throttle
/// khobor prothom_alo --max-stories 5 --request-delay 3
///
/// # See what sources are available
/// khobor --list-sources
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// News source to scrape (use --list-sources to see what is available)
    pub source: Option<String>,

    /// Root directory for the persisted collection and downloaded assets
    #[arg(short, long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Maximum number of stories to scrape in this run
    #[arg(short, long, default_value_t = 20)]
    pub max_stories: usize,

    /// Seconds to pause between story fetches
    #[arg(long, default_value_t = 2)]
    pub request_delay: u64,

    /// Retry attempts after a transient network failure
    #[arg(long, default_value_t = 3)]
    pub retry_count: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// List the registered sources and exit
    #[arg(long)]
    pub list_sources: bool,
}

impl Cli {
    /// Translate the parsed flags into a run configuration.
    pub fn scraping_config(&self) -> ScrapingConfig {
        ScrapingConfig {
            request_delay: Duration::from_secs(self.request_delay),
            max_stories: self.max_stories,
            retry_count: self.retry_count,
            timeout: Duration::from_secs(self.timeout),
            output_dir: self.output_dir.clone(),
        }
    }
}
