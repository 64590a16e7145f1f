//! End-to-end scrape driver.
//!
//! [`run_complete_scrape`] drives one run for a chosen source variant:
//! list stories, fetch each detail, resolve assets, persist the merged
//! results. One story is fully processed before the next begins; the
//! configured courtesy delay is a blocking pause on that single path, and
//! nothing here spawns concurrent workers.
//!
//! Per-story failures are recovered into the returned [`ScrapeOutcome`];
//! only an invalid configuration or a persistence failure unwinds to the
//! caller.

use std::path::PathBuf;
use std::time::Instant;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::assets::AssetDownloader;
use crate::config::ScrapingConfig;
use crate::error::HarvestError;
use crate::models::{AssetStatus, ScrapeOutcome, StoryDetail, StoryFailure};
use crate::scrapers::Scraper;
use crate::store::StoryStore;
use crate::transport::Transport;
use crate::utils::{asset_extension, slug_from_url, truncate_for_log};

/// Run one complete scrape for `scraper` and persist the results to `store`.
///
/// Cancelling `cancel` stops the run between stories; whatever successes
/// were already accumulated are persisted, never discarded.
#[instrument(level = "info", skip_all, fields(source = scraper.source_name()))]
pub async fn run_complete_scrape(
    scraper: &dyn Scraper,
    config: &ScrapingConfig,
    store: &dyn StoryStore,
    cancel: &CancellationToken,
) -> Result<ScrapeOutcome, HarvestError> {
    config.validate()?;
    let start = Instant::now();
    let mut outcome = ScrapeOutcome::default();

    if config.max_stories == 0 {
        info!("max_stories is 0; nothing to scrape");
        return Ok(outcome);
    }

    let transport = Transport::new(config)?;
    let downloader = AssetDownloader::new(&transport, &config.output_dir);

    let stubs = match scraper.list_stories(&transport, config.max_stories).await {
        Ok(stubs) => stubs,
        Err(e) => {
            // Not a hard failure: the run still reports what happened.
            warn!(error = %e, "story listing failed");
            outcome.failures.push(StoryFailure {
                canonical_url: scraper.source_name().to_string(),
                reason: format!("story listing failed: {e}"),
            });
            return Ok(outcome);
        }
    };
    info!(count = stubs.len(), "listed stories");

    for (index, stub) in stubs.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(
                processed = index,
                total = stubs.len(),
                "stop requested; persisting partial results"
            );
            break;
        }
        // Courtesy throttle between story fetches, skipped before the first.
        if index > 0 && !config.request_delay.is_zero() {
            sleep(config.request_delay).await;
        }

        info!(
            n = index + 1,
            total = stubs.len(),
            url = %stub.canonical_url,
            title = %stub.title,
            "fetching story detail"
        );
        match scraper.fetch_detail(&transport, stub).await {
            Ok(mut detail) => {
                resolve_assets(&downloader, &mut detail).await;
                outcome.successes.push(detail);
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    url = %stub.canonical_url,
                    reason = %truncate_for_log(&reason, 300),
                    "story skipped"
                );
                outcome.failures.push(StoryFailure {
                    canonical_url: stub.canonical_url.clone(),
                    reason,
                });
            }
        }
    }

    if !outcome.successes.is_empty() {
        let total = store.merge_and_save(&outcome.successes).await?;
        info!(persisted = total, "merged stories into collection");
    }

    info!(
        successes = outcome.successes.len(),
        failures = outcome.failures.len(),
        elapsed_secs = start.elapsed().as_secs(),
        "scrape run complete"
    );
    Ok(outcome)
}

/// Download every pending asset of a story to its deterministic location:
/// `<source_name>/images/<story_slug>/image_<n>.<ext>` under the output
/// root. A failed asset stays on the story marked `Failed`.
async fn resolve_assets(downloader: &AssetDownloader<'_>, detail: &mut StoryDetail) {
    let slug = slug_from_url(&detail.canonical_url);
    let mut resolved = Vec::with_capacity(detail.assets.len());

    for (index, asset) in detail.assets.drain(..).enumerate() {
        if asset.status != AssetStatus::Pending {
            resolved.push(asset);
            continue;
        }
        let filename = format!("image_{}.{}", index + 1, asset_extension(&asset.remote_url));
        let relative = PathBuf::from(&detail.source_name)
            .join("images")
            .join(&slug)
            .join(filename);
        resolved.push(downloader.download(&asset.remote_url, &relative).await);
    }

    detail.assets = resolved;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ScrapeError, StoreError};
    use crate::models::StoryStub;
    use crate::store::StoryMap;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn test_config(dir: &std::path::Path, max_stories: usize) -> ScrapingConfig {
        ScrapingConfig {
            request_delay: Duration::ZERO,
            max_stories,
            retry_count: 0,
            timeout: Duration::from_secs(2),
            output_dir: dir.to_path_buf(),
        }
    }

    fn stub(n: usize) -> StoryStub {
        StoryStub {
            source_name: "mock".to_string(),
            canonical_url: format!("https://example.com/story-{n}"),
            title: format!("Story {n}"),
            discovered_at: Utc::now(),
            hero_image_url: None,
        }
    }

    /// Scripted variant: serves canned stubs, fails the listed URLs, and
    /// counts every call. Optionally cancels a token after N fetches.
    struct MockScraper {
        stubs: Vec<StoryStub>,
        failing: Vec<String>,
        list_error: Option<String>,
        list_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl MockScraper {
        fn serving(stubs: Vec<StoryStub>) -> Self {
            Self {
                stubs,
                failing: Vec::new(),
                list_error: None,
                list_calls: AtomicUsize::new(0),
                fetch_calls: AtomicUsize::new(0),
                cancel_after: None,
            }
        }
    }

    #[async_trait]
    impl Scraper for MockScraper {
        fn source_name(&self) -> &str {
            "mock"
        }

        async fn list_stories(
            &self,
            _transport: &Transport,
            max_stories: usize,
        ) -> Result<Vec<StoryStub>, ScrapeError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(reason) = &self.list_error {
                return Err(ScrapeError::Transient(reason.clone()));
            }
            Ok(self.stubs.iter().take(max_stories).cloned().collect())
        }

        async fn fetch_detail(
            &self,
            _transport: &Transport,
            stub: &StoryStub,
        ) -> Result<StoryDetail, ScrapeError> {
            let calls = self.fetch_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((after, token)) = &self.cancel_after {
                if calls >= *after {
                    token.cancel();
                }
            }
            if self.failing.contains(&stub.canonical_url) {
                return Err(ScrapeError::Transient(format!(
                    "transient failure: {} timed out after retries",
                    stub.canonical_url
                )));
            }
            Ok(StoryDetail::from_stub(stub.clone()))
        }
    }

    /// In-memory implementation of the store contract.
    struct MemoryStore {
        map: Mutex<StoryMap>,
        save_calls: AtomicUsize,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                map: Mutex::new(StoryMap::new()),
                save_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StoryStore for MemoryStore {
        async fn load(&self) -> Result<StoryMap, StoreError> {
            Ok(self.map.lock().unwrap().clone())
        }

        async fn merge_and_save(&self, new_records: &[StoryDetail]) -> Result<usize, StoreError> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            let mut map = self.map.lock().unwrap();
            for story in new_records {
                map.insert(story.canonical_url.clone(), story.clone());
            }
            Ok(map.len())
        }
    }

    #[tokio::test]
    async fn test_one_bad_story_does_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut scraper = MockScraper::serving((1..=5).map(stub).collect());
        scraper.failing = vec!["https://example.com/story-3".to_string()];
        let store = MemoryStore::new();

        let outcome = run_complete_scrape(
            &scraper,
            &test_config(dir.path(), 5),
            &store,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.successes.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].canonical_url, "https://example.com/story-3");
        assert!(outcome.failures[0].reason.contains("transient"));

        // The four good stories were persisted.
        assert_eq!(store.save_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_max_stories_zero_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let scraper = MockScraper::serving((1..=5).map(stub).collect());
        let store = MemoryStore::new();

        let outcome = run_complete_scrape(
            &scraper,
            &test_config(dir.path(), 0),
            &store,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(outcome.successes.is_empty());
        assert!(outcome.failures.is_empty());
        assert_eq!(scraper.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(scraper.fetch_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_persists_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let mut scraper = MockScraper::serving((1..=5).map(stub).collect());
        scraper.cancel_after = Some((2, cancel.clone()));
        let store = MemoryStore::new();

        let outcome =
            run_complete_scrape(&scraper, &test_config(dir.path(), 5), &store, &cancel)
                .await
                .unwrap();

        // Stopped after the second story; the first two were kept and saved.
        assert_eq!(outcome.successes.len(), 2);
        assert_eq!(scraper.fetch_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.save_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_failure_is_recorded_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let mut scraper = MockScraper::serving(Vec::new());
        scraper.list_error = Some("HTTP 503".to_string());
        let store = MemoryStore::new();

        let outcome = run_complete_scrape(
            &scraper,
            &test_config(dir.path(), 5),
            &store,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(outcome.successes.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].canonical_url, "mock");
        assert!(outcome.failures[0].reason.contains("503"));
        assert_eq!(store.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let scraper = MockScraper::serving(Vec::new());
        let store = MemoryStore::new();
        let config = ScrapingConfig {
            timeout: Duration::ZERO,
            ..test_config(dir.path(), 5)
        };

        let err = run_complete_scrape(&scraper, &config, &store, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        struct FailingStore;

        #[async_trait]
        impl StoryStore for FailingStore {
            async fn load(&self) -> Result<StoryMap, StoreError> {
                Ok(StoryMap::new())
            }
            async fn merge_and_save(&self, _new: &[StoryDetail]) -> Result<usize, StoreError> {
                Err(StoreError::Write {
                    path: "/full/disk/stories.json".into(),
                    source: std::io::Error::other("no space left on device"),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let scraper = MockScraper::serving(vec![stub(1)]);

        let err = run_complete_scrape(
            &scraper,
            &test_config(dir.path(), 1),
            &FailingStore,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HarvestError::Store(_)));
    }

    #[tokio::test]
    async fn test_empty_listing_is_an_empty_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let scraper = MockScraper::serving(Vec::new());
        let store = MemoryStore::new();

        let outcome = run_complete_scrape(
            &scraper,
            &test_config(dir.path(), 5),
            &store,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(outcome.successes.is_empty());
        assert!(outcome.failures.is_empty());
        assert_eq!(store.save_calls.load(Ordering::SeqCst), 0);
    }
}
