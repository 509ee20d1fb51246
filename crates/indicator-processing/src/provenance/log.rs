use super::ProvenanceRecord;
use crate::error::{Result, ResultExt};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only JSON array of [`ProvenanceRecord`]s.
///
/// Each append holds an exclusive lock on the file for the whole
/// read-modify-write, so concurrent writers never lose records. Entries that
/// do not parse as records are preserved untouched.
#[derive(Debug, Clone)]
pub struct MetadataLog {
    path: PathBuf,
}

impl MetadataLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &ProvenanceRecord) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .context(format!("Opening metadata log {}", self.path.display()))?;
        file.lock()?;

        let mut entries = read_entries(&mut file)?;
        entries.push(serde_json::to_value(record)?);

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(serde_json::to_string_pretty(&entries)?.as_bytes())?;
        file.flush()?;
        file.unlock()?;

        debug!(
            "Appended provenance for '{}' to {} ({} entries)",
            record.file,
            self.path.display(),
            entries.len()
        );
        Ok(())
    }

    /// All well-formed records, oldest first. A missing log is empty.
    pub fn records(&self) -> Result<Vec<ProvenanceRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut file = File::open(&self.path)?;
        file.lock_shared()?;
        let entries = read_entries(&mut file)?;
        file.unlock()?;

        Ok(entries
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect())
    }
}

fn read_entries(file: &mut File) -> Result<Vec<serde_json::Value>> {
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}
