//! Idempotent media downloads.
//!
//! The downloader materializes files under a fixed output root and records
//! root-relative paths on the [`AssetRef`]s it returns, so the archive can be
//! moved wholesale. Bodies are streamed to disk chunk by chunk; a story's
//! hero image or gallery photo never has to fit in memory.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::error::ScrapeError;
use crate::models::AssetRef;
use crate::transport::Transport;

/// Downloads assets through a run's [`Transport`].
pub struct AssetDownloader<'a> {
    transport: &'a Transport,
    root: PathBuf,
}

impl<'a> AssetDownloader<'a> {
    pub fn new(transport: &'a Transport, root: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            root: root.into(),
        }
    }

    /// Download `remote_url` to `relative_dest` under the output root.
    ///
    /// Idempotent: an already-present destination file is returned as
    /// `Downloaded` without touching the network. Failures are reported on
    /// the returned ref; they never abort the owning story.
    #[instrument(level = "debug", skip(self, relative_dest), fields(dest = %relative_dest.display()))]
    pub async fn download(&self, remote_url: &str, relative_dest: &Path) -> AssetRef {
        let recorded = relative_dest.to_string_lossy().into_owned();
        let dest = self.root.join(relative_dest);

        if fs::try_exists(&dest).await.unwrap_or(false) {
            debug!("asset already present; skipping fetch");
            return AssetRef::downloaded(remote_url, recorded);
        }

        match self.fetch_to(remote_url, &dest).await {
            Ok(()) => AssetRef::downloaded(remote_url, recorded),
            Err(e) => {
                warn!(url = %remote_url, error = %e, "asset download failed");
                AssetRef::failed(remote_url, e.to_string())
            }
        }
    }

    async fn fetch_to(&self, remote_url: &str, dest: &Path) -> Result<(), ScrapeError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(parent, &e))?;
        }

        let response = self.transport.get_response(remote_url).await?;

        // Stream to a sibling temp file and rename on completion, so an
        // interrupted download never leaves a partial file at the final name.
        let tmp = part_path(dest);
        if let Err(e) = self.stream_body(response, remote_url, &tmp).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        fs::rename(&tmp, dest)
            .await
            .map_err(|e| write_error(dest, &e))
    }

    async fn stream_body(
        &self,
        response: reqwest::Response,
        remote_url: &str,
        tmp: &Path,
    ) -> Result<(), ScrapeError> {
        let mut file = fs::File::create(tmp).await.map_err(|e| write_error(tmp, &e))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ScrapeError::Transient(format!("{remote_url}: {e}")))?;
            file.write_all(&chunk).await.map_err(|e| write_error(tmp, &e))?;
        }
        file.flush().await.map_err(|e| write_error(tmp, &e))?;
        Ok(())
    }
}

fn write_error(path: &Path, e: &std::io::Error) -> ScrapeError {
    ScrapeError::Permanent(format!("writing {}: {e}", path.display()))
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
