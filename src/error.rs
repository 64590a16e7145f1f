//! Failure taxonomy for the scraping framework.
//!
//! Two tiers of failure exist and they never mix:
//! - [`ScrapeError`] covers everything that can go wrong with a single
//!   network call or document. These are recovered locally and aggregated
//!   into the run's outcome; they never unwind the call stack past the
//!   orchestrator.
//! - [`HarvestError`] covers the conditions that make a run meaningless
//!   (unknown source, bad configuration) or dangerous to ignore
//!   (persistence failure). These propagate to the caller.

use std::path::PathBuf;

/// A recoverable per-call or per-story failure.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Timeout, connection failure, or a server-side error. Eligible for
    /// retry; exhausting all retries still yields this variant, not a panic.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Client-side rejection such as not-found or forbidden. Never retried.
    #[error("permanent failure: {0}")]
    Permanent(String),

    /// The document did not match the shape this source is known to publish.
    #[error("parse failure: {0}")]
    Parse(String),
}

impl ScrapeError {
    /// Whether a retry could plausibly change the answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScrapeError::Transient(_))
    }
}

/// A persistence failure. Always fatal for the run: silently losing
/// already-scraped data is worse than stopping.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("persisted collection at {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize story collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A hard failure surfaced to the caller of [`run_complete_scrape`]
/// (or of the registry, before any network activity begins).
///
/// [`run_complete_scrape`]: crate::orchestrator::run_complete_scrape
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("unknown source {name:?} (registered sources: {available})")]
    UnknownSource { name: String, available: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
