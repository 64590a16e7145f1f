//! # Khobor
//!
//! A news scraping pipeline that extracts education stories and their media
//! assets from Bangladeshi news sites, normalizes them into a common record
//! shape, and persists them with de-duplication across runs.
//!
//! ## Features
//!
//! - Scrapes stories from multiple sources (The Daily Star, Prothom Alo)
//!   selected by name at runtime
//! - Downloads story images idempotently, streaming them to disk
//! - Merges results into a single JSON collection keyed by canonical URL,
//!   written atomically so a crash never corrupts earlier runs
//! - Retries transient network failures with exponential backoff; a single
//!   bad story never aborts a run
//!
//! ## Usage
//!
//! ```sh
//! khobor daily_star -o ./data --max-stories 10
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Listing**: Discover story stubs from the source's education section
//! 2. **Detail**: Fetch each story's full content, one at a time, with a
//!    courtesy delay between requests
//! 3. **Assets**: Resolve each story's images to local files
//! 4. **Persist**: Merge successes into the on-disk collection

use clap::Parser;
use std::error::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use khobor::cli::Cli;
use khobor::orchestrator::run_complete_scrape;
use khobor::registry::ScraperRegistry;
use khobor::store::JsonStore;
use khobor::utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    let registry = ScraperRegistry::with_builtin_sources();

    if args.list_sources {
        for name in registry.list_registered() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(source) = args.source.as_deref() else {
        return Err("no source given (try --list-sources)".into());
    };

    let config = args.scraping_config();

    // Early check: ensure the output directory is writable before any
    // network activity.
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let scraper = registry.create(source)?;
    let store = JsonStore::new(&config.output_dir);

    // Ctrl-C requests a cooperative stop; the run finishes the story in
    // flight, then persists what it has.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; finishing current story, then saving");
                cancel.cancel();
            }
        });
    }

    info!(
        source,
        max_stories = config.max_stories,
        output_dir = %config.output_dir.display(),
        "khobor starting up"
    );

    let outcome = run_complete_scrape(scraper.as_ref(), &config, &store, &cancel).await?;

    for failure in &outcome.failures {
        warn!(url = %failure.canonical_url, reason = %failure.reason, "story skipped");
    }
    info!(
        succeeded = outcome.successes.len(),
        skipped = outcome.failures.len(),
        collection = %store.path().display(),
        "Execution complete"
    );

    Ok(())
}
