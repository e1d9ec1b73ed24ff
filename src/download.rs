//! Saving a result locator to disk.

use crate::error::Result;
use crate::image::codec;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix of generated download file names.
pub const FILE_NAME_PREFIX: &str = "nano-canvas-";

/// Builds the download file name for a given Unix timestamp in milliseconds.
pub fn file_name_at(timestamp_ms: u128) -> String {
    format!("{FILE_NAME_PREFIX}{timestamp_ms}.png")
}

/// Builds the download file name for the current time.
pub fn default_file_name() -> String {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    file_name_at(now_ms)
}

/// Decodes `locator` and writes the image bytes to `path`.
pub async fn save_locator(locator: &str, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let (mime_type, bytes) = codec::parse_display_locator(locator)?;
    tokio::fs::write(path, &bytes).await?;

    tracing::debug!(
        path = %path.display(),
        mime_type = %mime_type,
        size = bytes.len(),
        "saved result image"
    );
    Ok(path.to_path_buf())
}

/// Saves `locator` into `dir` under a timestamped file name.
pub async fn save_to_dir(locator: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
    save_locator(locator, dir.as_ref().join(default_file_name())).await
}
