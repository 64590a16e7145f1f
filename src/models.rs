//! Data models for scraped stories and their media assets.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`StoryStub`]: Minimal listing-phase record identifying one story
//! - [`StoryDetail`]: Fully enriched story record including body and assets
//! - [`AssetRef`] / [`AssetStatus`]: One media file and its download state
//! - [`ScrapeOutcome`]: Aggregated successes and failures of one run
//! - [`StoryCollection`]: The on-disk envelope around persisted stories
//!
//! Optional fields are genuinely optional: a source that publishes no author
//! byline produces a record with `author: None`, not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal record identifying one story, produced by the listing phase.
///
/// Immutable once created; the detail-fetch phase reads it and produces a
/// fresh [`StoryDetail`] rather than mutating it. `canonical_url` is the
/// story's unique key, both within a run and in the persisted collection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoryStub {
    /// Registered name of the source this stub came from.
    pub source_name: String,
    /// Unique key for the story.
    pub canonical_url: String,
    /// Headline as it appeared on the listing page.
    pub title: String,
    /// When the listing phase first saw this story.
    pub discovered_at: DateTime<Utc>,
    /// Hero image from the listing card, when the source exposes one.
    /// Becomes the first asset of the fetched detail.
    pub hero_image_url: Option<String>,
}

/// Download state of one media asset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Discovered but not yet downloaded.
    Pending,
    /// Materialized on disk.
    Downloaded,
    /// Download failed; carries the reason. Never aborts the owning story.
    Failed(String),
}

/// Reference to one media file belonging to a story.
///
/// Built through the constructors below, which maintain the invariant that
/// `local_path` is set exactly when the status is [`AssetStatus::Downloaded`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetRef {
    /// Where the asset lives on the source's servers.
    pub remote_url: String,
    /// Path relative to the output directory, once downloaded.
    pub local_path: Option<String>,
    pub status: AssetStatus,
}

impl AssetRef {
    /// A discovered asset that has not been fetched yet.
    pub fn pending(remote_url: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            local_path: None,
            status: AssetStatus::Pending,
        }
    }

    /// An asset materialized at `local_path` (relative to the output root).
    pub fn downloaded(remote_url: impl Into<String>, local_path: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            local_path: Some(local_path.into()),
            status: AssetStatus::Downloaded,
        }
    }

    /// An asset whose download failed for the given reason.
    pub fn failed(remote_url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            local_path: None,
            status: AssetStatus::Failed(reason.into()),
        }
    }
}

/// A fully enriched story record.
///
/// Produced by a source variant's detail fetch; the orchestrator owns it
/// until it is handed to the store. Serialized with assets under `images`,
/// which is the shape the persisted collection uses.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoryDetail {
    pub canonical_url: String,
    pub source_name: String,
    pub title: String,
    /// Publication timestamp as the source reported it, verbatim. The
    /// shipped sources disagree on format, so no normalization is attempted.
    pub published_at: Option<String>,
    pub author: Option<String>,
    pub body_text: Option<String>,
    pub discovered_at: DateTime<Utc>,
    #[serde(rename = "images")]
    pub assets: Vec<AssetRef>,
}

impl StoryDetail {
    /// Start a detail record from a listing stub, carrying its identity over.
    pub fn from_stub(stub: StoryStub) -> Self {
        let assets = stub
            .hero_image_url
            .as_deref()
            .map(AssetRef::pending)
            .into_iter()
            .collect();
        Self {
            canonical_url: stub.canonical_url,
            source_name: stub.source_name,
            title: stub.title,
            published_at: None,
            author: None,
            body_text: None,
            discovered_at: stub.discovered_at,
            assets,
        }
    }
}

/// One story the run could not scrape, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryFailure {
    pub canonical_url: String,
    pub reason: String,
}

/// What one end-to-end run produced.
///
/// Expected per-story failures live in `failures`; they are values, never
/// unwound errors. A run with failures still returns `Ok(outcome)`.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub successes: Vec<StoryDetail>,
    pub failures: Vec<StoryFailure>,
}

/// On-disk envelope around the persisted stories.
#[derive(Debug, Deserialize, Serialize)]
pub struct StoryCollection {
    /// When the collection was last written.
    pub scraped_at: DateTime<Utc>,
    pub story_count: usize,
    pub stories: Vec<StoryDetail>,
}
