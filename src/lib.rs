//! Khobor core library.
//!
//! An extensible scraping framework for pulling education news stories and
//! their media assets out of Bangladeshi news sites, normalizing them into a
//! common record shape, and persisting them with de-duplication across runs.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transport`] - Reusable HTTP session with failure classification and retry
//! - [`assets`] - Idempotent, streaming media downloads
//! - [`store`] - Keyed persistence with atomic merge-on-save
//! - [`scrapers`] - The [`Scraper`] contract and the shipped source variants
//! - [`registry`] - Name-keyed lookup of scraper constructors
//! - [`orchestrator`] - [`run_complete_scrape`], the end-to-end run driver
//! - [`models`] - Story and asset record types
//! - [`config`] - Per-run configuration knobs
//! - [`error`] - Failure taxonomy

pub mod assets;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod scrapers;
pub mod store;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use assets::AssetDownloader;
pub use config::ScrapingConfig;
pub use error::{HarvestError, ScrapeError, StoreError};
pub use models::{
    AssetRef, AssetStatus, ScrapeOutcome, StoryCollection, StoryDetail, StoryFailure, StoryStub,
};
pub use orchestrator::run_complete_scrape;
pub use registry::{ScraperCtor, ScraperRegistry};
pub use scrapers::Scraper;
pub use store::{JsonStore, StoryStore};
pub use transport::Transport;
