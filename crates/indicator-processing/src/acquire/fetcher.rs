//! Fetcher trait and URL-driven downloads.

use crate::error::{Result, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// File name used when a URL path has no usable last segment.
pub const FALLBACK_FILE_NAME: &str = "downloaded_file";

/// Retrieves the body of a URL.
///
/// Implementations must be `Send + Sync`. A non-success response or a
/// transport error is a [`crate::error::PipelineError::DownloadFailure`].
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Last path segment of `url`, without its query string.
pub fn infer_file_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME);
    Ok(name.to_string())
}

/// Download `url` into `dest_dir`, returning the saved path and the bytes.
///
/// The file name is inferred from the URL unless `file_name` is given.
pub fn download_file(
    fetcher: &dyn Fetcher,
    url: &str,
    dest_dir: &Path,
    file_name: Option<&str>,
) -> Result<(PathBuf, Vec<u8>)> {
    let file_name = match file_name {
        Some(name) => name.to_string(),
        None => infer_file_name(url)?,
    };
    fs::create_dir_all(dest_dir)?;

    let bytes = fetcher.fetch(url)?;
    let path = dest_dir.join(file_name);
    fs::write(&path, &bytes).context(format!("Writing {}", path.display()))?;

    info!(
        "Downloaded {} bytes via {} to {}",
        bytes.len(),
        fetcher.name(),
        path.display()
    );
    Ok((path, bytes))
}
