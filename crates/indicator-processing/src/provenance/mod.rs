//! Provenance of acquired files.
//!
//! Every acquired dataset is registered in an append-only metadata log with
//! its row count and a SHA-256 digest of the raw bytes.

mod log;

pub use log::MetadataLog;

use crate::error::{Result, ResultExt};
use crate::loader::RawTable;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

/// One registered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub source: String,
    /// Base name of the registered file.
    pub file: String,
    /// Data rows after the skipped preamble.
    pub rows: usize,
    /// Hex SHA-256 of the raw file bytes.
    pub hash: String,
    /// UTC, RFC 3339.
    pub timestamp: String,
}

impl ProvenanceRecord {
    /// Record stamped with the current UTC time.
    pub fn new(source: impl Into<String>, path: &Path, rows: usize, hash: String) -> Self {
        Self {
            source: source.into(),
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            rows,
            hash,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).context(format!("Hashing {}", path.display()))?;
    Ok(hash_bytes(&bytes))
}

/// Count the data rows of a CSV, hash it and append a record to `log`.
pub fn register_csv(
    path: impl AsRef<Path>,
    skip_lines: usize,
    source: &str,
    log: &MetadataLog,
) -> Result<ProvenanceRecord> {
    let path = path.as_ref();
    let rows = RawTable::from_csv_path(path, skip_lines)?.height();
    let record = ProvenanceRecord::new(source, path, rows, hash_file(path)?);
    log.append(&record)?;

    info!(
        "Registered: {} | rows={}, hash={}",
        record.file, record.rows, record.hash
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_record_fields() {
        let path = Path::new("data/raw/undp_hdi.csv");
        let record = ProvenanceRecord::new("undp_hdi", path, 3, "ab".into());
        assert_eq!(record.file, "undp_hdi.csv");
        assert!(record.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn test_register_csv() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("worldbank_population.csv");
        std::fs::write(
            &csv,
            "\"Data Source\",\"WDI\"\n\n\"Country Name\",\"Country Code\",\"2020\"\n\"Aruba\",\"ABW\",\"1\"\n\"Chad\",\"TCD\",\"2\"\n",
        )
        .unwrap();
        let log = MetadataLog::new(dir.path().join("metadata.json"));

        let record = register_csv(&csv, 2, "worldbank_population", &log).unwrap();
        assert_eq!(record.rows, 2);
        assert_eq!(record.hash, hash_file(&csv).unwrap());
        assert_eq!(log.records().unwrap(), vec![record]);
    }
}
