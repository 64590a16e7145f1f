//! Utility functions for slugs, asset naming, string truncation, and output
//! directory validation.

use std::fs as stdfs;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Derive a story slug from its canonical URL.
///
/// The slug is the last path segment with any query string stripped, and is
/// used to name the story's asset directory. Repeated runs therefore address
/// the same files.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slug_from_url("https://example.com/education/admission-test?ref=home"), "admission-test");
/// ```
pub fn slug_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let last = last.split('?').next().unwrap_or(last);
    if last.is_empty() {
        "story".to_string()
    } else {
        last.to_string()
    }
}

/// File extension for a downloaded asset, taken from its remote URL.
///
/// Falls back to `jpg` when the URL carries no extension or something
/// implausible (the media CDNs of the shipped sources occasionally append
/// cache-buster suffixes that are not extensions).
pub fn asset_extension(remote_url: &str) -> String {
    let path = remote_url.split('?').next().unwrap_or(remote_url);
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext);
    match ext {
        Some(ext)
            if !ext.is_empty()
                && ext.len() <= 4
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary, since failure reasons can carry Bengali text)
/// with an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), io::Error> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
