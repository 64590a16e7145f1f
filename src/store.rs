//! Persistence of the scraped story collection.
//!
//! The collection is a keyed set of [`StoryDetail`] records, key =
//! `canonical_url`, living at a single well-known path under the output
//! directory. Merging is last-write-wins per key, and every save rewrites
//! the whole file through a temporary name plus rename, so a crash mid-write
//! never corrupts the previously persisted collection.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::models::{StoryCollection, StoryDetail};

/// The persisted collection in memory: canonical URL → story.
pub type StoryMap = BTreeMap<String, StoryDetail>;

/// Storage contract for scraped stories.
///
/// [`JsonStore`] is the file-backed implementation shipping with the crate;
/// an alternate sink (a database, say) implements the same pair of
/// operations and callers never notice.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Load the existing collection, or an empty one when nothing has been
    /// persisted yet.
    async fn load(&self) -> Result<StoryMap, StoreError>;

    /// Merge `new_records` into the persisted collection by canonical URL
    /// (last write wins on collision) and write the result back atomically.
    /// Returns the total number of stories now persisted.
    async fn merge_and_save(&self, new_records: &[StoryDetail]) -> Result<usize, StoreError>;
}

/// Well-known collection filename under the output directory.
pub const COLLECTION_FILE: &str = "stories.json";

/// JSON-file-backed [`StoryStore`].
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// A store persisting to `stories.json` under `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            path: output_dir.as_ref().join(COLLECTION_FILE),
        }
    }

    /// Where the collection file lives.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StoryStore for JsonStore {
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<StoryMap, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no persisted collection yet; starting empty");
                return Ok(StoryMap::new());
            }
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let collection: StoryCollection =
            serde_json::from_str(&raw).map_err(|e| StoreError::Malformed {
                path: self.path.clone(),
                source: e,
            })?;

        let mut map = StoryMap::new();
        for story in collection.stories {
            // Collapse any historical duplicates; the later occurrence wins.
            map.insert(story.canonical_url.clone(), story);
        }
        Ok(map)
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), new = new_records.len()))]
    async fn merge_and_save(&self, new_records: &[StoryDetail]) -> Result<usize, StoreError> {
        let mut map = self.load().await?;
        for story in new_records {
            map.insert(story.canonical_url.clone(), story.clone());
        }

        let stories: Vec<StoryDetail> = map.into_values().collect();
        let total = stories.len();
        let collection = StoryCollection {
            scraped_at: Utc::now(),
            story_count: total,
            stories,
        };
        let json = serde_json::to_string_pretty(&collection)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        // Full write to a temporary name, then rename over the destination.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|e| StoreError::Write {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Write {
                path: self.path.clone(),
                source: e,
            })?;

        info!(stories = total, "persisted story collection");
        Ok(total)
    }
}
