//! Source-specific scrapers and the contract they satisfy.
//!
//! Each source variant follows a consistent two-phase pattern:
//!
//! 1. **Listing**: Discover stories from the source's education section
//! 2. **Detail**: Download and parse the full content of one story
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | The Daily Star | [`daily_star`] | HTML scraping | Card-based markup on the education tag page |
//! | Prothom Alo | [`prothom_alo`] | Embedded JSON | Page state in `script[type="application/json"]` tags |
//!
//! # Common Patterns
//!
//! Variants are selected by name through the
//! [`ScraperRegistry`](crate::registry::ScraperRegistry) rather than a type
//! hierarchy, so each source's parsing logic stays fully isolated. Parsing is
//! factored into pure functions over fetched text, which keeps the variants
//! testable offline against fixture documents. Missing optional fields are
//! tolerated and recorded as absent; only a document that fails to yield a
//! story at all is a parse failure.

use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::models::{StoryDetail, StoryStub};
use crate::transport::Transport;

pub mod daily_star;
pub mod prothom_alo;

pub use daily_star::DailyStarScraper;
pub use prothom_alo::ProthomAloScraper;

/// Capability contract every source variant satisfies.
///
/// The transport is passed in by the orchestrator, so one run owns one
/// session and variants stay stateless document readers.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Stable name of the source; used for registry lookup and output paths.
    fn source_name(&self) -> &str;

    /// Discover up to `max_stories` stories from the source's listing.
    ///
    /// Returned stubs carry unique canonical URLs within the returned
    /// sequence. Sources with paginated listings follow the pages until the
    /// cap is reached or the source is exhausted.
    async fn list_stories(
        &self,
        transport: &Transport,
        max_stories: usize,
    ) -> Result<Vec<StoryStub>, ScrapeError>;

    /// Fetch and parse the full detail for one discovered story.
    ///
    /// Assets are returned `Pending`; downloading them is the orchestrator's
    /// job.
    async fn fetch_detail(
        &self,
        transport: &Transport,
        stub: &StoryStub,
    ) -> Result<StoryDetail, ScrapeError>;
}

impl std::fmt::Debug for dyn Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Scraper").field(&self.source_name()).finish()
    }
}
