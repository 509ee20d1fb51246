//! ZIP extraction with entry-name filters.

use crate::error::{Result, ResultExt};
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Whether an entry name passes the include/exclude substring filters.
///
/// An empty include list admits everything.
pub fn entry_selected(name: &str, include: &[String], exclude: &[String]) -> bool {
    if !include.is_empty() && !include.iter().any(|pat| name.contains(pat.as_str())) {
        return false;
    }
    !exclude.iter().any(|pat| name.contains(pat.as_str()))
}

/// Base name of an archive entry, whichever separator it uses.
fn base_name(entry_name: &str) -> &str {
    entry_name.rsplit(['/', '\\']).next().unwrap_or(entry_name)
}

/// Extract selected entries of a ZIP into `dest_dir`.
///
/// Entries are flattened to their base name and directories are skipped.
/// Returns the written paths in archive order; an empty result is left for
/// the caller to judge.
pub fn extract_from_zip(
    bytes: &[u8],
    dest_dir: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest_dir)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if !entry_selected(&name, include, exclude) {
            debug!("Skipping archive entry {}", name);
            continue;
        }
        let file_name = base_name(&name);
        if file_name.is_empty() {
            continue;
        }

        let dest_path = dest_dir.join(file_name);
        let mut out =
            File::create(&dest_path).context(format!("Creating {}", dest_path.display()))?;
        io::copy(&mut entry, &mut out)?;
        info!("Extracted: {}", dest_path.display());
        extracted.push(dest_path);
    }

    if extracted.is_empty() {
        warn!(
            "No files extracted (include {:?}, exclude {:?})",
            include, exclude
        );
    }
    Ok(extracted)
}
